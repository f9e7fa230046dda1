// crates/geoview-config/src/metadata/esri.rs
// ============================================================================
// Module: ESRI Metadata
// Description: ESRI REST service and layer metadata handling.
// Purpose: Derive overlays and group expansion from ESRI JSON documents.
// Dependencies: geoview-core, serde_json
// ============================================================================

//! ## Overview
//! ESRI services answer `?f=json` at the service root and `?f=pjson` per
//! layer. A document carrying an `error` key is a provider failure even when
//! the HTTP status is 200. A `Group Layer` expands into one child per
//! sub-layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::FetchError;
use geoview_core::GeoviewLayerType;
use geoview_core::LayerId;
use geoview_core::MetadataRequest;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::LeafMetadataOutcome;
use super::LeafMetadataPlan;
use super::SubLayer;
use crate::paths::esri_service_base;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Layer type reported by ESRI for service-side groups.
const GROUP_LAYER_TYPE: &str = "Group Layer";
/// Capability that makes a layer queryable.
const QUERY_CAPABILITY: &str = "query";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Service root document request.
pub(super) fn service_request(metadata_access_path: &str) -> MetadataRequest {
    MetadataRequest::json(format!("{}?f=json", esri_service_base(metadata_access_path)))
}

/// Decides the per-layer fetch of a dynamic or feature leaf.
pub(super) fn leaf_plan(
    format: GeoviewLayerType,
    layer_id: &LayerId,
    base: Option<&str>,
    service_metadata: Option<&Value>,
) -> LeafMetadataPlan {
    let Some(base) = base else {
        return LeafMetadataPlan::None;
    };
    if format == GeoviewLayerType::EsriDynamic
        && let Some(layers) = service_metadata.and_then(|meta| meta.get("layers")).and_then(Value::as_array)
        && !layers.iter().any(|layer| id_matches(layer.get("id"), layer_id))
    {
        return LeafMetadataPlan::NotFound(format!("layer {layer_id} is not published by the service"));
    }
    LeafMetadataPlan::Fetch(MetadataRequest::json(format!(
        "{}/{layer_id}?f=pjson",
        esri_service_base(base)
    )))
}

/// Rejects ESRI error payloads.
pub(super) fn check_payload(document: Value) -> Result<Value, FetchError> {
    if let Some(error) = document.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(FetchError::Provider(message));
    }
    Ok(document)
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Interprets one ESRI layer document.
pub(super) fn interpret_layer(layer: &Value) -> LeafMetadataOutcome {
    if layer.get("type").and_then(Value::as_str) == Some(GROUP_LAYER_TYPE) {
        return LeafMetadataOutcome::Group(sub_layers(layer));
    }
    LeafMetadataOutcome::Overlay(layer_overlay(layer))
}

/// Lists the children of a group layer document.
fn sub_layers(layer: &Value) -> Vec<SubLayer> {
    if let Some(entries) = layer.get("subLayers").and_then(Value::as_array) {
        return entries
            .iter()
            .filter_map(|entry| {
                Some(SubLayer {
                    layer_id: LayerId::new(id_string(entry.get("id"))?),
                    layer_name: entry.get("name").and_then(Value::as_str).map(str::to_string),
                })
            })
            .collect();
    }
    layer
        .get("subLayerIds")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|id| {
            Some(SubLayer {
                layer_id: LayerId::new(id_string(Some(id))?),
                layer_name: None,
            })
        })
        .collect()
}

/// Builds the default-layering overlay of a layer document.
fn layer_overlay(layer: &Value) -> Value {
    let mut overlay = Map::new();
    if let Some(name) = layer.get("name").and_then(Value::as_str) {
        overlay.insert("layerName".to_string(), Value::from(name));
    }
    for (field, key) in [("minScale", "minScale"), ("maxScale", "maxScale")] {
        if let Some(scale) = layer.get(field).and_then(Value::as_f64).filter(|scale| *scale > 0.0) {
            overlay.insert(key.to_string(), Value::from(scale));
        }
    }
    let mut source = Map::new();
    source.insert("featureInfo".to_string(), feature_info(layer));
    if let Some(projection) = spatial_reference(layer) {
        source.insert("dataProjection".to_string(), Value::from(projection));
    }
    overlay.insert("source".to_string(), Value::Object(source));
    if let Some(temporal) = temporal_dimension(layer) {
        overlay.insert("temporalDimension".to_string(), temporal);
    }
    Value::Object(overlay)
}

/// Builds the feature info block from capabilities and fields.
fn feature_info(layer: &Value) -> Value {
    let queryable = layer
        .get("capabilities")
        .and_then(Value::as_str)
        .is_some_and(|caps| caps.split(',').any(|cap| cap.trim().eq_ignore_ascii_case(QUERY_CAPABILITY)));
    let outfields: Vec<Value> = layer
        .get("fields")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|field| {
            let name = field.get("name").and_then(Value::as_str)?;
            let field_type = field_type(field.get("type").and_then(Value::as_str)?)?;
            let alias = field.get("alias").and_then(Value::as_str).unwrap_or(name);
            Some(json!({ "name": name, "alias": alias, "type": field_type }))
        })
        .collect();
    let mut info = json!({ "queryable": queryable, "outfields": outfields });
    if let Some(display) = layer.get("displayField").and_then(Value::as_str).filter(|name| !name.is_empty())
        && let Some(map) = info.as_object_mut()
    {
        map.insert("nameField".to_string(), Value::from(display));
    }
    info
}

/// Maps an ESRI field type to an outfield type; geometry and blobs are dropped.
fn field_type(esri_type: &str) -> Option<&'static str> {
    match esri_type {
        "esriFieldTypeOID" => Some("oid"),
        "esriFieldTypeDate" | "esriFieldTypeDateOnly" | "esriFieldTypeTimestampOffset" => Some("date"),
        "esriFieldTypeDouble"
        | "esriFieldTypeSingle"
        | "esriFieldTypeInteger"
        | "esriFieldTypeSmallInteger"
        | "esriFieldTypeBigInteger" => Some("number"),
        "esriFieldTypeGeometry" | "esriFieldTypeBlob" | "esriFieldTypeRaster" => None,
        _ => Some("string"),
    }
}

/// Reads the `EPSG:n` projection of the layer extent.
fn spatial_reference(layer: &Value) -> Option<String> {
    let reference = layer
        .get("extent")
        .and_then(|extent| extent.get("spatialReference"))
        .or_else(|| layer.get("spatialReference"))?;
    let wkid = reference.get("latestWkid").or_else(|| reference.get("wkid"))?.as_u64()?;
    Some(format!("EPSG:{wkid}"))
}

/// Reads the time dimension from `timeInfo`.
fn temporal_dimension(layer: &Value) -> Option<Value> {
    let time_info = layer.get("timeInfo")?;
    let field = time_info.get("startTimeField").and_then(Value::as_str)?;
    let mut temporal = json!({ "field": field, "singleHandle": time_info.get("endTimeField").is_none() });
    if let Some([start, end]) = time_info
        .get("timeExtent")
        .and_then(Value::as_array)
        .and_then(|extent| <&[Value; 2]>::try_from(extent.as_slice()).ok())
        && let (Some(start), Some(end)) = (start.as_i64(), end.as_i64())
        && let Some(map) = temporal.as_object_mut()
    {
        map.insert("range".to_string(), json!([format!("{start}/{end}")]));
        map.insert("default".to_string(), Value::from(end.to_string()));
    }
    Some(temporal)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a numeric or string id.
fn id_string(id: Option<&Value>) -> Option<String> {
    match id? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Returns true when a service layer id equals `layer_id`.
fn id_matches(id: Option<&Value>, layer_id: &LayerId) -> bool {
    id_string(id).is_some_and(|id| id == layer_id.as_str())
}
