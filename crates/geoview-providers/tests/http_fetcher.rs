// crates/geoview-providers/tests/http_fetcher.rs
// ============================================================================
// Module: HTTP Fetcher Tests
// Description: Loopback tests for the reqwest-backed metadata fetcher.
// Purpose: Pin status handling, size limits, redirects, timeouts, and aborts.
// Dependencies: axum, geoview-config, geoview-core, geoview-providers, tokio
// ============================================================================

//! ## Overview
//! Each test serves canned responses from a local axum router and fetches
//! them through [`HttpMetadataFetcher`].
//!
//! ## Security Posture
//! Servers may redirect, hang, or send oversized bodies. The fetcher must
//! fail closed in every case.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::time::Duration;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::get;
use geoview_config::HttpSettings;
use geoview_core::AbortController;
use geoview_core::AbortSignal;
use geoview_core::FetchError;
use geoview_core::MetadataBody;
use geoview_core::MetadataFetcher;
use geoview_core::MetadataRequest;
use geoview_providers::HttpMetadataFetcher;
use serde_json::Value;
use serde_json::json;

use crate::common::local_fetcher;
use crate::common::local_settings;
use crate::common::spawn_server;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Router with one route per response shape.
fn metadata_router() -> Router {
    Router::new()
        .route("/svc", get(|| async { Json(json!({ "layers": [ { "id": 0, "name": "Roads" } ] })) }))
        .route("/wms", get(|| async { "<WMS_Capabilities version=\"1.3.0\"/>" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/moved", get(|| async { Redirect::temporary("/svc") }))
        .route("/big", get(|| async { "x".repeat(4096) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        )
}

// ============================================================================
// SECTION: Responses
// ============================================================================

#[tokio::test]
async fn json_and_text_bodies_are_fetched() {
    let base = spawn_server(|_| metadata_router()).await;
    let fetcher = local_fetcher();
    let signal = AbortSignal::never();
    let body = fetcher.fetch(&MetadataRequest::json(format!("{base}/svc?f=json")), &signal).await.unwrap();
    let layers = body.into_json().unwrap();
    assert_eq!(layers.pointer("/layers/0/name").and_then(Value::as_str), Some("Roads"));
    let text = fetcher.fetch(&MetadataRequest::text(format!("{base}/wms")), &signal).await.unwrap();
    assert!(matches!(text, MetadataBody::Text(ref xml) if xml.starts_with("<WMS_Capabilities")));
}

#[tokio::test]
async fn error_statuses_are_reported() {
    let base = spawn_server(|_| metadata_router()).await;
    let url = format!("{base}/missing");
    let result = local_fetcher().fetch(&MetadataRequest::json(url.clone()), &AbortSignal::never()).await;
    assert_eq!(
        result,
        Err(FetchError::Status {
            url,
            status: 404,
        })
    );
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let base = spawn_server(|_| metadata_router()).await;
    let result = local_fetcher().fetch(&MetadataRequest::json(format!("{base}/moved")), &AbortSignal::never()).await;
    assert!(matches!(result, Err(FetchError::Status { status: 307, .. })), "{result:?}");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let base = spawn_server(|_| metadata_router()).await;
    let fetcher = HttpMetadataFetcher::from_settings(&HttpSettings {
        max_response_bytes: 1024,
        ..local_settings()
    })
    .unwrap();
    let result = fetcher.fetch(&MetadataRequest::text(format!("{base}/big")), &AbortSignal::never()).await;
    assert_eq!(
        result,
        Err(FetchError::TooLarge {
            limit: 1024,
        })
    );
}

#[tokio::test]
async fn unparseable_json_is_a_parse_error() {
    let base = spawn_server(|_| metadata_router()).await;
    let result = local_fetcher().fetch(&MetadataRequest::json(format!("{base}/wms")), &AbortSignal::never()).await;
    assert!(matches!(result, Err(FetchError::Parse(_))), "{result:?}");
}

// ============================================================================
// SECTION: Policy
// ============================================================================

#[tokio::test]
async fn cleartext_urls_need_opt_in() {
    let base = spawn_server(|_| metadata_router()).await;
    let fetcher = HttpMetadataFetcher::from_settings(&HttpSettings::default()).unwrap();
    let result = fetcher.fetch(&MetadataRequest::json(format!("{base}/svc")), &AbortSignal::never()).await;
    assert!(matches!(result, Err(FetchError::Policy(_))), "{result:?}");
}

// ============================================================================
// SECTION: Timeouts & Cancellation
// ============================================================================

#[tokio::test]
async fn slow_servers_time_out() {
    let base = spawn_server(|_| metadata_router()).await;
    let fetcher = HttpMetadataFetcher::from_settings(&HttpSettings {
        timeout_ms: 200,
        connect_timeout_ms: 100,
        ..local_settings()
    })
    .unwrap();
    let result = fetcher.fetch(&MetadataRequest::text(format!("{base}/slow")), &AbortSignal::never()).await;
    assert!(matches!(result, Err(FetchError::Transport(_))), "{result:?}");
}

#[tokio::test]
async fn aborts_cancel_in_flight_requests() {
    let base = spawn_server(|_| metadata_router()).await;
    let fetcher = local_fetcher();
    let controller = AbortController::new();
    let signal = controller.signal();
    let aborter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.abort();
    });
    let started = Instant::now();
    let result = fetcher.fetch(&MetadataRequest::text(format!("{base}/slow")), &signal).await;
    aborter.await.unwrap();
    assert_eq!(result, Err(FetchError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn aborted_signals_skip_the_request() {
    let controller = AbortController::new();
    controller.abort();
    let result = local_fetcher().fetch(&MetadataRequest::json("https://unreachable.invalid/svc"), &controller.signal()).await;
    assert_eq!(result, Err(FetchError::Cancelled));
}
