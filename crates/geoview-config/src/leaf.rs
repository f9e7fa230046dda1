// crates/geoview-config/src/leaf.rs
// ============================================================================
// Module: Leaf Entry Construction
// Description: Builds leaf entries and recomputes their layered settings.
// Purpose: Apply hard defaults, metadata, and user input in one pure pass.
// Dependencies: geoview-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A leaf is built from its raw user JSON in three steps: identity, default
//! layering, and data access path normalization. Layering is always computed
//! from scratch as `merge_layers(hard_defaults, metadata_overlay, user_input)`,
//! so a metadata fetch simply recomputes the leaf with a new overlay.
//! Missing mandatory fields are the only thrown failures; schema violations
//! are recorded on the node by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::EntryConfig;
use geoview_core::GeoviewLayerType;
use geoview_core::InitialSettings;
use geoview_core::LayerId;
use geoview_core::LeafConfig;
use geoview_core::SourceConfig;
use geoview_core::TemporalDimension;
use geoview_core::deep_merge;
use geoview_core::merge_layers;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::ConfigError;
use crate::paths::normalize_data_access_path;
use crate::schema::source_format_label;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs shared by every leaf of one geoview layer.
#[derive(Debug, Clone, Copy)]
pub struct LeafContext<'a> {
    /// Source format of the owning geoview layer.
    pub format: GeoviewLayerType,
    /// Metadata access path of the owning geoview layer.
    pub metadata_access_path: Option<&'a str>,
}

/// Typed view over the merged leaf JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayeredLeaf {
    /// Display name.
    #[serde(default)]
    layer_name: Option<String>,
    /// Source settings.
    #[serde(default)]
    source: SourceConfig,
    /// Style definition.
    #[serde(default)]
    style: Option<Value>,
    /// Filter expression.
    #[serde(default)]
    layer_filter: Option<String>,
    /// Minimum scale denominator.
    #[serde(default)]
    min_scale: Option<f64>,
    /// Maximum scale denominator.
    #[serde(default)]
    max_scale: Option<f64>,
    /// Time dimension.
    #[serde(default)]
    temporal_dimension: Option<TemporalDimension>,
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Reads the `layerId` of a raw entry; integers are accepted.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when the id is absent or empty.
pub fn parse_layer_id(raw: &Value) -> Result<LayerId, ConfigError> {
    match raw.get("layerId") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(LayerId::new(id.trim())),
        Some(Value::Number(id)) => Ok(LayerId::new(id.to_string())),
        _ => Err(ConfigError::MissingField("layerId".to_string())),
    }
}

/// Cascades the parent's initial settings into a raw entry's own settings.
#[must_use]
pub fn cascade_initial_settings(parent: &InitialSettings, raw: &Value) -> InitialSettings {
    let Some(own) = raw.get("initialSettings") else {
        return parent.clone();
    };
    let Ok(mut merged) = serde_json::to_value(parent) else {
        return parent.clone();
    };
    deep_merge(&mut merged, own);
    serde_json::from_value(merged).unwrap_or_else(|_| parent.clone())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the hard defaults of a leaf format.
#[must_use]
pub fn hard_defaults(format: GeoviewLayerType) -> Value {
    let mut source = serde_json::Map::new();
    if let Some(label) = source_format_label(format) {
        source.insert("format".to_string(), Value::from(label));
    }
    let extra = match format {
        GeoviewLayerType::Csv => json!({
            "separator": ",",
            "dataProjection": "EPSG:4326",
            "featureInfo": { "queryable": true }
        }),
        GeoviewLayerType::GeoJson | GeoviewLayerType::Kml | GeoviewLayerType::Wkb => json!({
            "dataProjection": "EPSG:4326",
            "featureInfo": { "queryable": true }
        }),
        GeoviewLayerType::GeoPackage
        | GeoviewLayerType::Shapefile
        | GeoviewLayerType::EsriFeature
        | GeoviewLayerType::OgcFeature => json!({
            "featureInfo": { "queryable": true }
        }),
        GeoviewLayerType::OgcWfs => json!({
            "strategy": "all",
            "featureInfo": { "queryable": true }
        }),
        GeoviewLayerType::OgcWms => json!({
            "serverType": "mapserver",
            "crossOrigin": "anonymous",
            "featureInfo": { "queryable": false }
        }),
        GeoviewLayerType::EsriDynamic => json!({
            "featureInfo": { "queryable": false }
        }),
        GeoviewLayerType::XyzTiles => json!({
            "crossOrigin": "anonymous",
            "dataProjection": "EPSG:3857"
        }),
        GeoviewLayerType::ImageStatic | GeoviewLayerType::EsriImage => json!({
            "crossOrigin": "anonymous"
        }),
        GeoviewLayerType::VectorTiles | GeoviewLayerType::GeoTiff | GeoviewLayerType::GeoCore => {
            json!({})
        }
    };
    let mut source = Value::Object(source);
    deep_merge(&mut source, &extra);
    json!({ "source": source })
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds a leaf entry from its raw user JSON.
///
/// The entry is returned unlinked; the tree assigns its path on insertion.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when the layer id or every source of
/// a data access path is missing, and [`ConfigError::Parse`] when the merged
/// settings cannot be read.
pub fn build_leaf(
    raw: &Value,
    context: LeafContext<'_>,
    parent_settings: &InitialSettings,
) -> Result<EntryConfig, ConfigError> {
    let layer_id = parse_layer_id(raw)?;
    let mut entry = EntryConfig::new_leaf(layer_id, LeafConfig::empty(context.format), raw.clone());
    entry.initial_settings = cascade_initial_settings(parent_settings, raw);
    relayer_leaf(&mut entry, &Value::Null, context)?;
    Ok(entry)
}

/// Recomputes a leaf's settings from its user input and a metadata overlay.
///
/// # Errors
///
/// Returns [`ConfigError`] when the data access path cannot be derived or the
/// merged settings cannot be read. The entry is left unchanged on error.
pub fn relayer_leaf(
    entry: &mut EntryConfig,
    metadata_overlay: &Value,
    context: LeafContext<'_>,
) -> Result<(), ConfigError> {
    let merged = merge_layers(&hard_defaults(context.format), metadata_overlay, entry.user_input());
    let layered: LayeredLeaf =
        serde_json::from_value(merged).map_err(|err| ConfigError::Parse(err.to_string()))?;
    let mut source = layered.source;
    let path = normalize_data_access_path(
        context.format,
        source.data_access_path.as_deref(),
        context.metadata_access_path,
        &entry.layer_id,
    )?;
    source.data_access_path = Some(path);
    let leaf = LeafConfig {
        format: context.format,
        source,
        style: layered.style,
        layer_filter: layered.layer_filter,
        min_scale: layered.min_scale,
        max_scale: layered.max_scale,
        temporal_dimension: layered.temporal_dimension,
    };
    let Some(slot) = entry.as_leaf_mut() else {
        return Err(ConfigError::Invalid(format!("{} is not a leaf", entry.layer_path())));
    };
    *slot = leaf;
    entry.layer_name = layered.layer_name;
    Ok(())
}

#[cfg(test)]
mod tests;
