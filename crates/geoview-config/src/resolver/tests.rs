// crates/geoview-config/src/resolver/tests.rs
// ============================================================================
// Module: Resolver Tests
// Description: Unit tests for the async resolution pipeline.
// Purpose: Pin metadata layering, partial failure, and cancellation.
// Dependencies: geoview-config, geoview-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Resolves small roots against an in-memory fetcher and checks node status,
//! recorded failures, callbacks, and diagnostics.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use geoview_core::AbortController;
use geoview_core::AbortSignal;
use geoview_core::EVENT_LAYER_ENTRY_ERROR;
use geoview_core::EVENT_METADATA_FETCH_FAILED;
use geoview_core::FetchError;
use geoview_core::GEOVIEW_LAYER_SCHEMA_PATH;
use geoview_core::InMemoryMetadataFetcher;
use geoview_core::LayerEntryError;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerPath;
use geoview_core::LayerStatus;
use geoview_core::MemoryDiagnosticSink;
use serde_json::Value;
use serde_json::json;

use super::LayerConfigResolver;
use crate::geoview_layer::GeoviewLayerConfig;
use crate::settings::ResolverSettings;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn resolver(fetcher: InMemoryMetadataFetcher) -> (LayerConfigResolver, Arc<MemoryDiagnosticSink>) {
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(Arc::new(fetcher), ResolverSettings::default(), sink.clone()).unwrap();
    (resolver, sink)
}

async fn resolve_all(
    resolver: &LayerConfigResolver,
    raw: &[Value],
    signal: &AbortSignal,
) -> (Vec<GeoviewLayerConfig>, Vec<LayerEntryError>) {
    let mut reported = Vec::new();
    let mut on_error = |error: &LayerEntryError| reported.push(error.clone());
    let configs = resolver.prevalidate_geoview_layers_config(raw, signal, &mut on_error).await;
    (configs, reported)
}

fn node_status(config: &GeoviewLayerConfig, path: &str) -> (LayerStatus, Option<LayerEntryErrorKind>) {
    let node = config.layer_config(&LayerPath::parse(path)).unwrap();
    (node.layer_status(), node.error().map(|error| error.kind))
}

fn esri_dynamic() -> Value {
    json!({
        "geoviewLayerId": "esri",
        "geoviewLayerType": "esriDynamic",
        "metadataAccessPath": "https://x/rest/services/S/MapServer/",
        "listOfLayerEntryConfig": [ { "layerId": "0" }, { "layerId": "5" } ]
    })
}

fn esri_fetcher() -> InMemoryMetadataFetcher {
    InMemoryMetadataFetcher::new()
        .with_json(
            "https://x/rest/services/S/MapServer?f=json",
            json!({ "layers": [ { "id": 0 }, { "id": 2 }, { "id": 3 } ] }),
        )
        .with_json(
            "https://x/rest/services/S/MapServer/0?f=pjson",
            json!({
                "id": 0,
                "name": "Roads",
                "type": "Feature Layer",
                "capabilities": "Map,Query",
                "minScale": 500000,
                "maxScale": 0,
                "displayField": "NAME",
                "fields": [ { "name": "NAME", "type": "esriFieldTypeString", "alias": "Name" } ]
            }),
        )
        .with_json(
            "https://x/rest/services/S/MapServer/2?f=pjson",
            json!({ "id": 2, "name": "Water", "type": "Group Layer", "subLayers": [ { "id": 3, "name": "Rivers" } ] }),
        )
        .with_json(
            "https://x/rest/services/S/MapServer/3?f=pjson",
            json!({ "id": 3, "name": "Rivers", "type": "Feature Layer", "minScale": 250000, "maxScale": 1000 }),
        )
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

#[tokio::test]
async fn file_layers_resolve_without_fetching() {
    let fetcher = Arc::new(InMemoryMetadataFetcher::new());
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(fetcher.clone(), ResolverSettings::default(), sink).unwrap();
    let raw = vec![json!({
        "geoviewLayerId": "cities",
        "geoviewLayerType": "CSV",
        "metadataAccessPath": "https://x/data",
        "listOfLayerEntryConfig": [ { "layerId": "42" } ]
    })];
    let (configs, reported) = resolve_all(&resolver, &raw, &AbortSignal::never()).await;
    assert!(reported.is_empty());
    assert_eq!(configs.len(), 1);
    assert_eq!(node_status(&configs[0], "cities/42"), (LayerStatus::Processed, None));
    let leaf = configs[0].layer_config(&LayerPath::parse("cities/42")).unwrap().as_leaf().unwrap();
    assert_eq!(leaf.source.data_access_path.as_deref(), Some("https://x/data/42.csv"));
    assert_eq!(leaf.source.separator.as_deref(), Some(","));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn esri_metadata_is_layered_and_missing_layers_fail_alone() {
    let (resolver, sink) = resolver(esri_fetcher());
    let (configs, reported) = resolve_all(&resolver, &[esri_dynamic()], &AbortSignal::never()).await;
    let config = &configs[0];
    assert_eq!(node_status(config, "esri/0"), (LayerStatus::Processed, None));
    assert_eq!(node_status(config, "esri/5"), (LayerStatus::Error, Some(LayerEntryErrorKind::LayerNotFound)));
    let roads = config.layer_config(&LayerPath::parse("esri/0")).unwrap();
    assert_eq!(roads.layer_name.as_deref(), Some("Roads"));
    let leaf = roads.as_leaf().unwrap();
    assert_eq!(leaf.min_scale, Some(500_000.0));
    assert_eq!(leaf.max_scale, None);
    assert_eq!(leaf.source.data_access_path.as_deref(), Some("https://x/rest/services/S/MapServer/"));
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].layer_path.as_str(), "esri/5");
    let events = sink.events();
    assert_eq!(events.iter().filter(|event| event.event == EVENT_LAYER_ENTRY_ERROR).count(), 1);
}

#[tokio::test]
async fn user_values_win_over_metadata() {
    let (resolver, _sink) = resolver(esri_fetcher());
    let raw = json!({
        "geoviewLayerId": "esri",
        "geoviewLayerType": "esriDynamic",
        "metadataAccessPath": "https://x/rest/services/S/MapServer",
        "listOfLayerEntryConfig": [ { "layerId": "0", "layerName": "My roads", "minScale": 10000 } ]
    });
    let (configs, _) = resolve_all(&resolver, &[raw], &AbortSignal::never()).await;
    let roads = configs[0].layer_config(&LayerPath::parse("esri/0")).unwrap();
    assert_eq!(roads.layer_name.as_deref(), Some("My roads"));
    assert_eq!(roads.as_leaf().unwrap().min_scale, Some(10_000.0));
}

#[tokio::test]
async fn group_layers_expand_into_metadata_groups() {
    let (resolver, _sink) = resolver(esri_fetcher());
    let raw = json!({
        "geoviewLayerId": "esri",
        "geoviewLayerType": "esriDynamic",
        "metadataAccessPath": "https://x/rest/services/S/MapServer",
        "listOfLayerEntryConfig": [ { "layerId": "2" } ]
    });
    let (configs, reported) = resolve_all(&resolver, &[raw], &AbortSignal::never()).await;
    assert!(reported.is_empty());
    let config = &configs[0];
    let group = config.layer_config(&LayerPath::parse("esri/2")).unwrap();
    let body = group.as_group().unwrap();
    assert!(body.is_metadata_layer_group);
    assert_eq!(body.min_scale, Some(250_000.0));
    assert_eq!(body.max_scale, Some(1000.0));
    assert_eq!(group.layer_status(), LayerStatus::Processed);
    let rivers = config.layer_config(&LayerPath::parse("esri/2/3")).unwrap();
    assert_eq!(rivers.layer_name.as_deref(), Some("Rivers"));
    assert_eq!(rivers.layer_status(), LayerStatus::Processed);
}

#[tokio::test]
async fn service_failure_marks_every_leaf() {
    let fetcher = InMemoryMetadataFetcher::new().with_error(
        "https://x/rest/services/S/MapServer?f=json",
        FetchError::Transport("connection refused".to_string()),
    );
    let (resolver, sink) = resolver(fetcher);
    let (configs, reported) = resolve_all(&resolver, &[esri_dynamic()], &AbortSignal::never()).await;
    assert_eq!(node_status(&configs[0], "esri/0").1, Some(LayerEntryErrorKind::MetadataFetch));
    assert_eq!(node_status(&configs[0], "esri/5").1, Some(LayerEntryErrorKind::MetadataFetch));
    assert_eq!(reported.len(), 2);
    assert!(sink.events().iter().any(|event| event.event == EVENT_METADATA_FETCH_FAILED));
}

#[tokio::test]
async fn resolved_roots_are_checked_against_the_internal_root_fragment() {
    let (resolver, _sink) = resolver(esri_fetcher());
    let (mut configs, _reported) = resolve_all(&resolver, &[esri_dynamic()], &AbortSignal::never()).await;
    let mut config = configs.remove(0);
    assert!(config.error().is_none());
    let serialized = config.to_json().unwrap();
    assert!(resolver.validator().validate(GEOVIEW_LAYER_SCHEMA_PATH, &serialized, true));
    let mut unknown_field = serialized.clone();
    unknown_field["layerStyle"] = json!({});
    assert!(!resolver.validator().validate(GEOVIEW_LAYER_SCHEMA_PATH, &unknown_field, true));
    config.initial_settings.min_zoom = Some(99.0);
    resolver.validate_internal_root(&mut config);
    let error = config.error().unwrap();
    assert_eq!(error.kind, LayerEntryErrorKind::InternalSchemaViolation);
    assert_eq!(error.layer_path.as_str(), "esri");
}

#[tokio::test]
async fn repeated_root_ids_are_reported_without_resolving() {
    let fetcher = Arc::new(esri_fetcher());
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(fetcher.clone(), ResolverSettings::default(), sink).unwrap();
    let raw = vec![esri_dynamic(), esri_dynamic()];
    let (configs, reported) = resolve_all(&resolver, &raw, &AbortSignal::never()).await;
    assert_eq!(configs.len(), 1);
    let duplicates: Vec<&LayerEntryError> =
        reported.iter().filter(|error| error.kind == LayerEntryErrorKind::MalformedEntry).collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].layer_path.as_str(), "esri");
    let service_requests =
        fetcher.requests().iter().filter(|url| url.as_str() == "https://x/rest/services/S/MapServer?f=json").count();
    assert_eq!(service_requests, 1);
}

#[tokio::test]
async fn unreadable_roots_are_reported_and_dropped() {
    let (resolver, _sink) = resolver(InMemoryMetadataFetcher::new());
    let raw = vec![
        json!({ "geoviewLayerType": "CSV", "listOfLayerEntryConfig": [] }),
        json!({ "geoviewLayerId": "bad", "geoviewLayerType": "CSV", "listOfLayerEntryConfig": "nope" }),
        json!({ "geoviewLayerId": "core", "geoviewLayerType": "geoCore", "listOfLayerEntryConfig": [] }),
    ];
    let (configs, reported) = resolve_all(&resolver, &raw, &AbortSignal::never()).await;
    assert_eq!(reported.len(), 3);
    assert_eq!(reported[0].layer_path.as_str(), "0");
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].error().map(|error| error.kind), Some(LayerEntryErrorKind::SchemaViolation));
    assert_eq!(configs[1].geoview_layer_id().as_str(), "core");
    assert!(configs[1].error().is_some());
}

#[tokio::test]
async fn single_root_resolution_reports_through_the_callback() {
    let (resolver, _sink) = resolver(esri_fetcher());
    let mut reported = Vec::new();
    let mut on_error = |error: &LayerEntryError| reported.push(error.kind);
    let config = resolver.resolve_geoview_layer(&esri_dynamic(), &AbortSignal::never(), &mut on_error).await;
    assert!(config.is_some());
    assert_eq!(reported, vec![LayerEntryErrorKind::LayerNotFound]);
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[tokio::test]
async fn abort_cancels_pending_nodes_without_callbacks() {
    let fetcher = InMemoryMetadataFetcher::new()
        .with_json("https://x/rest/services/S/MapServer?f=json", json!({ "layers": [ { "id": 0 } ] }))
        .with_hang("https://x/rest/services/S/MapServer/0?f=pjson");
    let (resolver, sink) = resolver(fetcher);
    let controller = AbortController::new();
    let signal = controller.signal();
    let trigger = controller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.abort();
    });
    let raw = json!({
        "geoviewLayerId": "esri",
        "geoviewLayerType": "esriDynamic",
        "metadataAccessPath": "https://x/rest/services/S/MapServer",
        "listOfLayerEntryConfig": [ { "layerId": "0" } ]
    });
    let (configs, reported) = resolve_all(&resolver, &[raw], &signal).await;
    assert!(reported.is_empty());
    assert_eq!(
        node_status(&configs[0], "esri/0"),
        (LayerStatus::Cancelled, Some(LayerEntryErrorKind::Cancelled))
    );
    assert!(sink.events().iter().all(|event| event.event != EVENT_LAYER_ENTRY_ERROR));
}

#[tokio::test]
async fn already_aborted_signals_fetch_nothing() {
    let fetcher = Arc::new(esri_fetcher());
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(fetcher.clone(), ResolverSettings::default(), sink).unwrap();
    let controller = AbortController::new();
    controller.abort();
    let (configs, reported) = resolve_all(&resolver, &[esri_dynamic()], &controller.signal()).await;
    assert!(reported.is_empty());
    assert!(fetcher.requests().is_empty());
    assert_eq!(node_status(&configs[0], "esri/0").0, LayerStatus::Cancelled);
}
