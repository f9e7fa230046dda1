//! Runtime helper tests for geoview-core.
// crates/geoview-core/tests/runtime_helpers.rs
// =============================================================================
// Module: Runtime Helper Tests
// Description: Tests for the in-memory fetcher and diagnostic sinks.
// Purpose: Ensure reference implementations honor the interface contracts.
// =============================================================================

use std::time::Duration;

use geoview_core::AbortController;
use geoview_core::AbortSignal;
use geoview_core::ConfigDiagnostic;
use geoview_core::DiagnosticSink;
use geoview_core::EVENT_SCHEMA_VALIDATION_FAILED;
use geoview_core::FetchError;
use geoview_core::FileDiagnosticSink;
use geoview_core::InMemoryMetadataFetcher;
use geoview_core::MemoryDiagnosticSink;
use geoview_core::MetadataBody;
use geoview_core::MetadataFetcher;
use geoview_core::MetadataRequest;
use serde_json::Value;
use serde_json::json;

type TestResult = Result<(), String>;

// ============================================================================
// SECTION: In-Memory Fetcher
// ============================================================================

#[tokio::test]
async fn in_memory_fetcher_answers_registered_urls() -> TestResult {
    let fetcher = InMemoryMetadataFetcher::new()
        .with_json("https://svc/a", json!({"name": "a"}))
        .with_text("https://svc/b", "<xml/>");
    let signal = AbortSignal::never();
    let a = fetcher.fetch(&MetadataRequest::json("https://svc/a"), &signal).await.map_err(|e| e.to_string())?;
    assert_eq!(a, MetadataBody::Json(json!({"name": "a"})));
    let b = fetcher.fetch(&MetadataRequest::text("https://svc/b"), &signal).await.map_err(|e| e.to_string())?;
    assert_eq!(b.as_text(), Some("<xml/>"));
    assert_eq!(fetcher.requests(), vec!["https://svc/a".to_string(), "https://svc/b".to_string()]);
    Ok(())
}

#[tokio::test]
async fn in_memory_fetcher_reports_unknown_urls_as_not_found() {
    let fetcher = InMemoryMetadataFetcher::new();
    let err = fetcher.fetch(&MetadataRequest::json("https://svc/missing"), &AbortSignal::never()).await;
    assert!(matches!(err, Err(FetchError::Status { status: 404, .. })));
}

#[tokio::test]
async fn hanging_fetch_ends_cancelled_on_abort() {
    let fetcher = std::sync::Arc::new(InMemoryMetadataFetcher::new().with_hang("https://svc/slow"));
    let controller = AbortController::new();
    let signal = controller.signal();
    let task_fetcher = std::sync::Arc::clone(&fetcher);
    let task = tokio::spawn(async move {
        task_fetcher.fetch(&MetadataRequest::json("https://svc/slow"), &signal).await
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.abort();
    let joined = tokio::time::timeout(Duration::from_secs(1), task).await;
    assert!(matches!(joined, Ok(Ok(Err(FetchError::Cancelled)))));
}

#[test]
fn fetch_error_codes_are_stable() {
    assert_eq!(FetchError::Cancelled.code(), "cancelled");
    assert_eq!(FetchError::TooLarge { limit: 1 }.code(), "too_large");
    assert_eq!(FetchError::Provider("x".to_string()).code(), "provider");
}

// ============================================================================
// SECTION: Diagnostic Sinks
// ============================================================================

#[test]
fn memory_sink_keeps_events_in_order() {
    let sink = MemoryDiagnosticSink::new();
    sink.record(&ConfigDiagnostic::new(EVENT_SCHEMA_VALIDATION_FAILED, "first").with_schema_path("layers/CSV"));
    sink.record(&ConfigDiagnostic::new(EVENT_SCHEMA_VALIDATION_FAILED, "second"));
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].schema_path.as_deref(), Some("layers/CSV"));
    assert_eq!(events[1].message, "second");
}

#[test]
fn file_sink_appends_json_lines() -> TestResult {
    let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
    let path = dir.path().join("diagnostics.jsonl");
    let sink = FileDiagnosticSink::new(&path).map_err(|e| e.to_string())?;
    sink.record(
        &ConfigDiagnostic::new(EVENT_SCHEMA_VALIDATION_FAILED, "bad entry")
            .with_layer_path("gv/0")
            .with_candidate(json!({"layerId": 0})),
    );
    sink.record(&ConfigDiagnostic::new(EVENT_SCHEMA_VALIDATION_FAILED, "again"));
    let text = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let lines: Vec<Value> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["event"], EVENT_SCHEMA_VALIDATION_FAILED);
    assert_eq!(lines[0]["layer_path"], "gv/0");
    assert_eq!(lines[0]["candidate"]["layerId"], 0);
    assert!(lines[1].get("candidate").is_none());
    Ok(())
}
