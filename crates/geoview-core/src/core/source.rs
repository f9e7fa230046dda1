// crates/geoview-core/src/core/source.rs
// ============================================================================
// Module: GeoView Source Settings
// Description: Format-specific source, feature info, and initial settings types.
// Purpose: Strongly typed views over the layered source configuration JSON.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! These types are the typed result of default layering. Layering itself runs
//! on JSON values (see [`crate::merge_layers`]); the merged object is then
//! deserialized into these structs. Unknown fields are ignored here because
//! the schema validator, not serde, decides what a valid entry looks like.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Source
// ============================================================================

/// Format-specific source settings of a leaf layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Normalized path or URL of the layer data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_access_path: Option<String>,
    /// Data format understood by the renderer (`CSV`, `EsriJSON`, `WFS`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Projection of the source data (`EPSG:4326`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_projection: Option<String>,
    /// Column separator for delimited formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    /// Cross-origin policy for image requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<String>,
    /// Loading strategy for vector sources (`all` or `bbox`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// WMS server flavour (`mapserver`, `geoserver`, `qgis`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
    /// WMS style name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms_style: Option<String>,
    /// Optional POST settings for data requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_settings: Option<Value>,
    /// Feature info (query) settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_info: Option<FeatureInfo>,
}

/// Query settings of a leaf layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfo {
    /// Whether features can be queried.
    #[serde(default)]
    pub queryable: bool,
    /// Field used as the feature display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,
    /// Fields returned by queries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outfields: Vec<OutField>,
}

/// A field returned by feature queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutField {
    /// Field name.
    pub name: String,
    /// Display alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Field type label (`string`, `number`, `date`, `oid`, `url`).
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Time dimension settings of a time-aware leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalDimension {
    /// Field or dimension name carrying time values.
    pub field: String,
    /// Default time value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Available time values or `start/end/period` ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range: Vec<String>,
    /// Whether the time slider uses one handle.
    #[serde(default)]
    pub single_handle: bool,
}

// ============================================================================
// SECTION: Initial Settings
// ============================================================================

/// Initial display settings, cascaded from parent to child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialSettings {
    /// Initial layer states.
    #[serde(default)]
    pub states: LayerStates,
    /// Minimum zoom level at which the layer is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    /// Maximum zoom level at which the layer is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// Extent limiting where the layer is shown (`[minx, miny, maxx, maxy]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<[f64; 4]>,
    /// CSS class name applied to the rendered layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

/// Initial visibility and interaction states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStates {
    /// Whether the layer is visible.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Layer opacity between 0 and 1.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Whether hover interaction is enabled.
    #[serde(default = "default_true")]
    pub hoverable: bool,
    /// Whether query interaction is enabled.
    #[serde(default = "default_true")]
    pub queryable: bool,
    /// Whether the legend starts collapsed.
    #[serde(default)]
    pub legend_collapsed: bool,
}

impl Default for LayerStates {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: default_opacity(),
            hoverable: true,
            queryable: true,
            legend_collapsed: false,
        }
    }
}

/// Serde default helper returning `true`.
const fn default_true() -> bool {
    true
}

/// Serde default helper for full opacity.
const fn default_opacity() -> f64 {
    1.0
}
