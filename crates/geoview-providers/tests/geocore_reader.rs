// crates/geoview-providers/tests/geocore_reader.rs
// ============================================================================
// Module: GeoCore Reader Tests
// Description: Loopback tests for catalogue reads and geoCore expansion.
// Purpose: Pin the request shape, map-level expansion, and abort behavior.
// Dependencies: axum, geoview-config, geoview-core, geoview-providers, tokio
// ============================================================================

//! ## Overview
//! A local axum router plays both the GeoCore `vcs` endpoint and a WMS
//! service. Catalogue entries are read over HTTP and resolved end to end.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::routing::get;
use geoview_config::GeocoreSettings;
use geoview_config::LayerConfigResolver;
use geoview_config::MapFeatureConfig;
use geoview_config::ResolverSettings;
use geoview_core::AbortController;
use geoview_core::AbortSignal;
use geoview_core::DisplayLanguage;
use geoview_core::LayerConfigReader;
use geoview_core::LayerEntryError;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerPath;
use geoview_core::LayerStatus;
use geoview_core::MemoryDiagnosticSink;
use geoview_providers::UuidConfigReader;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::common::local_fetcher;
use crate::common::local_settings;
use crate::common::spawn_server;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// WMS capabilities served next to the catalogue.
const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Capability>
    <Layer>
      <Layer queryable="1">
        <Name>rivers</Name>
        <Title>Rivers</Title>
        <MinScaleDenominator>1000</MinScaleDenominator>
        <MaxScaleDenominator>5000000</MaxScaleDenominator>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

/// Catalogue handler that knows a single WMS record.
async fn vcs(State(base): State<String>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let lang = params.get("lang").cloned().unwrap_or_default();
    let rcs: Vec<Value> = params
        .get("id")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .filter(|id| *id == "wms-uuid")
        .map(|id| {
            json!({
                "id": id,
                "name": "Rivers of Canada",
                "url": format!("{base}/wms"),
                "layerType": "ogcWms",
                "layerEntries": [ { "id": "rivers" } ]
            })
        })
        .collect();
    let mut by_lang = Map::new();
    by_lang.insert(lang.clone(), Value::Array(rcs));
    Json(json!({
        "response": {
            "rcs": by_lang,
            "gcs": [ { lang: { "packages": { "geochart": { "chart": "line" } } } } ]
        }
    }))
}

/// Router serving the catalogue and the WMS capabilities.
fn catalogue_router(base: String) -> Router {
    Router::new()
        .route("/vcs", get(vcs))
        .route("/wms", get(|| async { CAPABILITIES }))
        .with_state(base)
}

/// Builds settings pointing the catalogue at `base`.
fn settings_for(base: &str) -> ResolverSettings {
    ResolverSettings {
        http: local_settings(),
        geocore: GeocoreSettings {
            base_url: base.to_string(),
            language: DisplayLanguage::Fr,
        },
        ..ResolverSettings::default()
    }
}

// ============================================================================
// SECTION: Reads
// ============================================================================

#[tokio::test]
async fn catalogue_reads_use_the_requested_language() {
    let base = spawn_server(catalogue_router).await;
    let settings = settings_for(&base);
    let reader =
        UuidConfigReader::new(Arc::new(local_fetcher()), settings.geocore, Arc::new(MemoryDiagnosticSink::new()));
    let outcome = reader
        .read_layer_configs(&["wms-uuid".to_string(), "gone".to_string()], DisplayLanguage::Fr, &AbortSignal::never())
        .await;
    assert!(!outcome.cancelled);
    assert_eq!(outcome.layers.len(), 1);
    assert_eq!(outcome.layers[0]["metadataAccessPath"], json!(format!("{base}/wms")));
    assert_eq!(outcome.geocharts, vec![json!({ "chart": "line" })]);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].layer_path.as_str(), "gone");
    assert_eq!(outcome.errors[0].kind, LayerEntryErrorKind::LayerNotFound);
}

#[tokio::test]
async fn geocore_roots_resolve_end_to_end() {
    let base = spawn_server(catalogue_router).await;
    let settings = settings_for(&base);
    let fetcher = Arc::new(local_fetcher());
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(fetcher.clone(), settings.clone(), sink.clone()).unwrap();
    let reader = UuidConfigReader::new(fetcher, settings.geocore, sink);
    let mut config = MapFeatureConfig::prevalidate(
        &json!({ "map": { "listOfGeoviewLayerConfig": [
            { "geoviewLayerId": "wms-uuid", "geoviewLayerType": "geoCore" },
            { "geoviewLayerId": "gone-uuid", "geoviewLayerType": "geoCore" }
        ] } }),
        resolver.validator(),
    )
    .unwrap();
    let mut reported = Vec::new();
    let mut on_error = |error: &LayerEntryError| reported.push(error.clone());
    let reader: &dyn LayerConfigReader = &reader;
    config.resolve_layers(&resolver, Some(reader), &AbortSignal::never(), &mut on_error).await;

    assert_eq!(config.layers().len(), 1);
    let rivers = config.layer_config(&LayerPath::parse("wms-uuid/rivers")).unwrap();
    assert_eq!(rivers.layer_status(), LayerStatus::Processed);
    let leaf = rivers.as_leaf().unwrap();
    assert_eq!(leaf.min_scale, Some(5_000_000.0));
    assert_eq!(leaf.max_scale, Some(1000.0));
    assert_eq!(reported.len(), 1, "{reported:?}");
    assert_eq!(reported[0].layer_path.as_str(), "gone-uuid");
    assert_eq!(reported[0].kind, LayerEntryErrorKind::LayerNotFound);
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[tokio::test]
async fn aborted_catalogue_reads_add_nothing() {
    let base = spawn_server(|_| {
        Router::new().route(
            "/vcs",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        )
    })
    .await;
    let settings = settings_for(&base);
    let reader =
        UuidConfigReader::new(Arc::new(local_fetcher()), settings.geocore, Arc::new(MemoryDiagnosticSink::new()));
    let controller = AbortController::new();
    let signal = controller.signal();
    let aborter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.abort();
    });
    let mut reported = Vec::new();
    let mut on_error = |error: &LayerEntryError| reported.push(error.clone());
    let response = reader
        .get_gv_config_from_uuids(&base, DisplayLanguage::En, &["a".to_string()], &signal, &mut on_error)
        .await;
    aborter.await.unwrap();
    assert!(response.cancelled);
    assert!(response.layers.is_empty());
    assert!(response.geocharts.is_empty());
    assert!(reported.is_empty());
}
