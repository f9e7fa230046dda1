// crates/geoview-config/src/paths/tests.rs
// ============================================================================
// Module: Data Access Path Tests
// Description: Unit tests for per-format path derivation.
// Purpose: Pin the derivation rule of every format and its idempotence.
// Dependencies: geoview-config, proptest
// ============================================================================

//! ## Overview
//! Covers concrete-path detection, derivation from metadata access paths,
//! ESRI index stripping, and idempotent re-normalization.

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

use geoview_core::GeoviewLayerType;
use geoview_core::LayerId;
use proptest::prelude::*;

use super::esri_service_base;
use super::is_concrete;
use super::normalize_data_access_path;
use super::normalize_metadata_access_path;
use crate::error::ConfigError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn derive(format: GeoviewLayerType, data: Option<&str>, meta: Option<&str>, id: &str) -> String {
    normalize_data_access_path(format, data, meta, &LayerId::from(id)).unwrap()
}

// ============================================================================
// SECTION: Concrete Paths
// ============================================================================

#[test]
fn concrete_paths_are_detected() {
    assert!(is_concrete(GeoviewLayerType::Csv, "https://x/a.CSV"));
    assert!(is_concrete(GeoviewLayerType::GeoJson, "https://x/a.json"));
    assert!(is_concrete(GeoviewLayerType::Kml, "blob:https://x/123"));
    assert!(is_concrete(GeoviewLayerType::EsriFeature, "https://x/FeatureServer/0?token=1"));
    assert!(is_concrete(GeoviewLayerType::XyzTiles, "https://x/{z}/{x}/{y}.png"));
    assert!(!is_concrete(GeoviewLayerType::Csv, "https://x/data"));
    assert!(!is_concrete(GeoviewLayerType::XyzTiles, "https://x/MapServer"));
}

#[test]
fn concrete_paths_are_left_unchanged() {
    let path = "https://x/data/points.geojson";
    assert_eq!(derive(GeoviewLayerType::GeoJson, Some(path), Some("https://y"), "ignored"), path);
}

// ============================================================================
// SECTION: Derivation Rules
// ============================================================================

#[test]
fn csv_path_joins_layer_id_and_extension() {
    assert_eq!(derive(GeoviewLayerType::Csv, None, Some("https://x/data"), "42"), "https://x/data/42.csv");
    assert_eq!(derive(GeoviewLayerType::Csv, None, Some("https://x/data/"), "42"), "https://x/data/42.csv");
}

#[test]
fn file_formats_append_their_extension() {
    assert_eq!(derive(GeoviewLayerType::GeoJson, None, Some("https://x"), "a"), "https://x/a.geojson");
    assert_eq!(derive(GeoviewLayerType::Kml, None, Some("https://x"), "a"), "https://x/a.kml");
    assert_eq!(derive(GeoviewLayerType::Wkb, None, Some("https://x"), "a"), "https://x/a.wkb");
    assert_eq!(derive(GeoviewLayerType::GeoPackage, None, Some("https://x"), "a"), "https://x/a.gpkg");
    assert_eq!(derive(GeoviewLayerType::Shapefile, None, Some("https://x"), "a"), "https://x/a.zip");
    assert_eq!(derive(GeoviewLayerType::GeoTiff, None, Some("https://x"), "a"), "https://x/a.tif");
}

#[test]
fn file_layer_id_with_extension_is_not_doubled() {
    assert_eq!(derive(GeoviewLayerType::Csv, None, Some("https://x"), "a.csv"), "https://x/a.csv");
}

#[test]
fn esri_paths_end_with_slash_and_drop_layer_index() {
    let base = "https://x/rest/services/S/FeatureServer";
    assert_eq!(derive(GeoviewLayerType::EsriFeature, None, Some(base), "0"), format!("{base}/"));
    assert_eq!(
        derive(GeoviewLayerType::EsriFeature, Some(&format!("{base}/3")), None, "3"),
        format!("{base}/")
    );
    assert_eq!(
        derive(GeoviewLayerType::EsriDynamic, None, Some("https://x/rest/services/S/MapServer/"), "1"),
        "https://x/rest/services/S/MapServer/"
    );
}

#[test]
fn ogc_feature_path_points_at_items() {
    assert_eq!(
        derive(GeoviewLayerType::OgcFeature, None, Some("https://x/api"), "lakes"),
        "https://x/api/collections/lakes/items"
    );
    assert_eq!(
        derive(GeoviewLayerType::OgcFeature, None, Some("https://x/api/collections"), "lakes"),
        "https://x/api/collections/lakes/items"
    );
}

#[test]
fn tile_paths_receive_templates() {
    assert_eq!(
        derive(GeoviewLayerType::XyzTiles, None, Some("https://x/MapServer"), "0"),
        "https://x/MapServer/tile/{z}/{y}/{x}"
    );
    assert_eq!(
        derive(GeoviewLayerType::VectorTiles, None, Some("https://x/VectorTileServer/"), "0"),
        "https://x/VectorTileServer/tile/{z}/{y}/{x}.pbf"
    );
}

#[test]
fn wms_and_wfs_keep_service_endpoint() {
    assert_eq!(derive(GeoviewLayerType::OgcWms, None, Some("https://x/wms"), "layer"), "https://x/wms");
    assert_eq!(derive(GeoviewLayerType::OgcWfs, Some("https://x/wfs"), None, "layer"), "https://x/wfs");
}

#[test]
fn static_image_joins_layer_id_once() {
    assert_eq!(derive(GeoviewLayerType::ImageStatic, None, Some("https://x/img"), "map"), "https://x/img/map");
    assert_eq!(derive(GeoviewLayerType::ImageStatic, Some("https://x/img/map"), None, "map"), "https://x/img/map");
}

#[test]
fn missing_paths_are_a_missing_field() {
    let err = normalize_data_access_path(GeoviewLayerType::Csv, None, Some("  "), &LayerId::from("1"))
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingField("source.dataAccessPath".to_string()));
}

#[test]
fn geocore_owns_no_data_path() {
    let err = normalize_data_access_path(GeoviewLayerType::GeoCore, None, Some("https://x"), &LayerId::from("1"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedLayerType(_)));
}

// ============================================================================
// SECTION: ESRI Helpers
// ============================================================================

#[test]
fn esri_helpers_split_index() {
    assert_eq!(esri_service_base("https://x/S/ImageServer/12/"), "https://x/S/ImageServer");
    assert_eq!(esri_service_base("https://x/S/Other/12"), "https://x/S/Other/12");
    assert_eq!(esri_service_base("https://x/S/MapServer/7"), "https://x/S/MapServer");
    assert_eq!(esri_service_base("https://x/S/MapServer"), "https://x/S/MapServer");
    assert_eq!(esri_service_base("https://x/S/FeatureServer/layer"), "https://x/S/FeatureServer/layer");
}

#[test]
fn metadata_access_path_drops_trailing_slashes() {
    assert_eq!(normalize_metadata_access_path(" https://x/wms/ "), "https://x/wms");
    assert_eq!(normalize_metadata_access_path("https://x/wms?map=a/"), "https://x/wms?map=a/");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn normalization_is_idempotent(
        format_index in 0usize..16,
        host in "[a-z]{1,8}",
        segments in prop::collection::vec("[A-Za-z0-9]{1,6}", 0..4),
        trailing in any::<bool>(),
        layer_id in "[a-z0-9]{1,8}",
    ) {
        let format = GeoviewLayerType::ALL[format_index];
        let mut base = format!("https://{host}/{}", segments.join("/"));
        if trailing {
            base.push('/');
        }
        let id = LayerId::new(layer_id);
        let once = normalize_data_access_path(format, None, Some(&base), &id).unwrap();
        let twice = normalize_data_access_path(format, Some(&once), None, &id).unwrap();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn meta_file_directory_is_the_data_base() {
    assert_eq!(
        derive(GeoviewLayerType::GeoJson, None, Some("https://x/data/layers.meta"), "rivers"),
        "https://x/data/rivers.geojson"
    );
}
