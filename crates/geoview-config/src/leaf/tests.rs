// crates/geoview-config/src/leaf/tests.rs
// ============================================================================
// Module: Leaf Construction Tests
// Description: Unit tests for leaf identity, layering, and path derivation.
// Purpose: Pin default precedence and re-layering from stored user input.
// Dependencies: geoview-config, serde_json
// ============================================================================

//! ## Overview
//! Exercises hard defaults per format, user-over-metadata precedence, and the
//! recompute-from-scratch behavior of re-layering.

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

use geoview_core::EntryType;
use geoview_core::GeoviewLayerType;
use geoview_core::InitialSettings;
use serde_json::json;

use super::LeafContext;
use super::build_leaf;
use super::cascade_initial_settings;
use super::hard_defaults;
use super::parse_layer_id;
use super::relayer_leaf;
use crate::error::ConfigError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn context(format: GeoviewLayerType, metadata_access_path: Option<&str>) -> LeafContext<'_> {
    LeafContext {
        format,
        metadata_access_path,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn csv_leaf_derives_path_and_defaults() {
    let raw = json!({ "layerId": "42" });
    let entry = build_leaf(
        &raw,
        context(GeoviewLayerType::Csv, Some("https://x/data")),
        &InitialSettings::default(),
    )
    .unwrap();
    let leaf = entry.as_leaf().unwrap();
    assert_eq!(entry.entry_type(), EntryType::Vector);
    assert_eq!(leaf.source.data_access_path.as_deref(), Some("https://x/data/42.csv"));
    assert_eq!(leaf.source.separator.as_deref(), Some(","));
    assert_eq!(leaf.source.format.as_deref(), Some("CSV"));
    assert_eq!(leaf.source.data_projection.as_deref(), Some("EPSG:4326"));
}

#[test]
fn integer_layer_ids_are_accepted() {
    assert_eq!(parse_layer_id(&json!({ "layerId": 3 })).unwrap().as_str(), "3");
    assert_eq!(parse_layer_id(&json!({ "layerId": " a " })).unwrap().as_str(), "a");
    assert!(matches!(
        parse_layer_id(&json!({ "layerId": "" })),
        Err(ConfigError::MissingField(_))
    ));
}

#[test]
fn missing_paths_are_a_missing_field() {
    let err = build_leaf(
        &json!({ "layerId": "a" }),
        context(GeoviewLayerType::GeoJson, None),
        &InitialSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingField(field) if field == "source.dataAccessPath"));
}

#[test]
fn user_values_win_over_metadata_and_defaults() {
    let raw = json!({
        "layerId": "0",
        "layerName": "Mine",
        "source": { "featureInfo": { "nameField": "user_name" } }
    });
    let ctx = context(GeoviewLayerType::EsriFeature, Some("https://x/FeatureServer"));
    let mut entry = build_leaf(&raw, ctx, &InitialSettings::default()).unwrap();
    let overlay = json!({
        "layerName": "From service",
        "maxScale": 5000.0,
        "source": { "featureInfo": { "nameField": "svc_name", "queryable": false } }
    });
    relayer_leaf(&mut entry, &overlay, ctx).unwrap();
    let leaf = entry.as_leaf().unwrap();
    let info = leaf.source.feature_info.as_ref().unwrap();
    assert_eq!(entry.layer_name.as_deref(), Some("Mine"));
    assert_eq!(info.name_field.as_deref(), Some("user_name"));
    assert!(!info.queryable);
    assert_eq!(leaf.max_scale, Some(5000.0));
    assert_eq!(leaf.source.data_access_path.as_deref(), Some("https://x/FeatureServer/"));
}

#[test]
fn relayering_recomputes_from_scratch() {
    let ctx = context(GeoviewLayerType::GeoJson, Some("https://x/files"));
    let mut entry =
        build_leaf(&json!({ "layerId": "rivers" }), ctx, &InitialSettings::default()).unwrap();
    relayer_leaf(&mut entry, &json!({ "layerName": "First" }), ctx).unwrap();
    relayer_leaf(&mut entry, &json!({ "minScale": 10.0 }), ctx).unwrap();
    let leaf = entry.as_leaf().unwrap();
    assert_eq!(entry.layer_name, None);
    assert_eq!(leaf.min_scale, Some(10.0));
    assert_eq!(leaf.source.data_access_path.as_deref(), Some("https://x/files/rivers.geojson"));
}

#[test]
fn hard_defaults_carry_format_labels() {
    assert_eq!(hard_defaults(GeoviewLayerType::OgcWfs)["source"]["strategy"], "all");
    assert_eq!(hard_defaults(GeoviewLayerType::OgcWms)["source"]["serverType"], "mapserver");
    assert_eq!(hard_defaults(GeoviewLayerType::VectorTiles)["source"]["format"], "MVT");
    assert!(hard_defaults(GeoviewLayerType::EsriDynamic)["source"].get("format").is_none());
}

#[test]
fn initial_settings_cascade_from_parent() {
    let parent = cascade_initial_settings(
        &InitialSettings::default(),
        &json!({ "initialSettings": { "states": { "opacity": 0.5 }, "minZoom": 3 } }),
    );
    let child = cascade_initial_settings(
        &parent,
        &json!({ "initialSettings": { "states": { "visible": false } } }),
    );
    assert!((child.states.opacity - 0.5).abs() < f64::EPSILON);
    assert!(!child.states.visible);
    assert_eq!(child.min_zoom, Some(3.0));
}
