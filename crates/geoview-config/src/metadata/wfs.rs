// crates/geoview-config/src/metadata/wfs.rs
// ============================================================================
// Module: WFS Metadata
// Description: WFS GetCapabilities and DescribeFeatureType handling.
// Purpose: Resolve feature types, projections, and outfields for WFS leaves.
// Dependencies: geoview-core, roxmltree, serde_json
// ============================================================================

//! ## Overview
//! Capabilities become `{ "version", "featureTypes": [ { name, title,
//! defaultCrs } ] }`. Each leaf then fetches its DescribeFeatureType as JSON;
//! geometry properties (`gml:*`) are not outfields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::FetchError;
use geoview_core::LayerId;
use geoview_core::MetadataRequest;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::LeafMetadataOutcome;
use super::LeafMetadataPlan;
use super::child_element;
use super::child_text;
use super::epsg_code;
use super::same_layer_name;
use super::with_query;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// GetCapabilities query parameters.
const CAPABILITIES_QUERY: &str = "service=WFS&version=2.0.0&request=GetCapabilities";
/// DescribeFeatureType query parameters, without the type name.
const DESCRIBE_QUERY: &str =
    "service=WFS&version=2.0.0&request=DescribeFeatureType&outputFormat=application/json";
/// Elements naming the default CRS across WFS versions.
const CRS_ELEMENTS: [&str; 3] = ["DefaultCRS", "DefaultSRS", "SRS"];

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Capabilities request for a WFS endpoint.
pub(super) fn service_request(metadata_access_path: &str) -> MetadataRequest {
    MetadataRequest::text(with_query(metadata_access_path, CAPABILITIES_QUERY))
}

/// Decides the DescribeFeatureType fetch of a leaf.
pub(super) fn leaf_plan(
    layer_id: &LayerId,
    base: Option<&str>,
    service_metadata: Option<&Value>,
) -> LeafMetadataPlan {
    let type_name = match service_metadata {
        Some(capabilities) => match find_feature_type(capabilities, layer_id) {
            Some(feature_type) => {
                feature_type.get("name").and_then(Value::as_str).unwrap_or(layer_id.as_str()).to_string()
            }
            None => {
                return LeafMetadataPlan::NotFound(format!(
                    "feature type {layer_id} is not in the capabilities"
                ));
            }
        },
        None => layer_id.as_str().to_string(),
    };
    let Some(base) = base else {
        return LeafMetadataPlan::None;
    };
    let query = format!("{DESCRIBE_QUERY}&typeName={type_name}");
    LeafMetadataPlan::Fetch(MetadataRequest::json(with_query(base, &query)))
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a capabilities document into its feature type list.
pub(super) fn parse_capabilities(xml: &str) -> Result<Value, FetchError> {
    let document = roxmltree::Document::parse(xml).map_err(|err| FetchError::Parse(err.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() == "ExceptionReport" {
        let message = root
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "ExceptionText")
            .and_then(|node| node.text())
            .map_or_else(|| "service exception".to_string(), |text| text.trim().to_string());
        return Err(FetchError::Provider(message));
    }
    let feature_types: Vec<Value> = child_element(root, "FeatureTypeList")
        .into_iter()
        .flat_map(|list| list.children())
        .filter(|node| node.is_element() && node.tag_name().name() == "FeatureType")
        .filter_map(|node| {
            let name = child_text(node, "Name")?;
            let mut feature_type = Map::new();
            feature_type.insert("name".to_string(), Value::from(name));
            if let Some(title) = child_text(node, "Title") {
                feature_type.insert("title".to_string(), Value::from(title));
            }
            if let Some(crs) = CRS_ELEMENTS.iter().find_map(|element| child_text(node, element)) {
                feature_type.insert("defaultCrs".to_string(), Value::from(crs));
            }
            Some(Value::Object(feature_type))
        })
        .collect();
    Ok(json!({
        "version": root.attribute("version").unwrap_or_default(),
        "featureTypes": feature_types,
    }))
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Interprets the feature type and its description.
pub(super) fn interpret(
    layer_id: &LayerId,
    leaf_metadata: Option<&Value>,
    service_metadata: Option<&Value>,
) -> LeafMetadataOutcome {
    let feature_type = match service_metadata {
        Some(capabilities) => match find_feature_type(capabilities, layer_id) {
            Some(feature_type) => Some(feature_type),
            None => {
                return LeafMetadataOutcome::NotFound(format!(
                    "feature type {layer_id} is not in the capabilities"
                ));
            }
        },
        None => None,
    };
    let mut overlay = Map::new();
    let mut source = Map::new();
    if let Some(feature_type) = feature_type {
        if let Some(title) = feature_type.get("title").and_then(Value::as_str) {
            overlay.insert("layerName".to_string(), Value::from(title));
        }
        if let Some(projection) =
            feature_type.get("defaultCrs").and_then(Value::as_str).and_then(epsg_code)
        {
            source.insert("dataProjection".to_string(), Value::from(projection));
        }
    }
    if let Some(description) = leaf_metadata {
        source.insert("featureInfo".to_string(), json!({ "outfields": outfields(description) }));
    }
    if !source.is_empty() {
        overlay.insert("source".to_string(), Value::Object(source));
    }
    LeafMetadataOutcome::Overlay(Value::Object(overlay))
}

/// Reads outfields from a JSON DescribeFeatureType response.
fn outfields(description: &Value) -> Vec<Value> {
    description
        .get("featureTypes")
        .and_then(Value::as_array)
        .and_then(|types| types.first())
        .and_then(|feature_type| feature_type.get("properties"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|property| {
            let name = property.get("name").and_then(Value::as_str)?;
            let raw_type = property.get("type").and_then(Value::as_str).unwrap_or_default();
            if raw_type.starts_with("gml:") {
                return None;
            }
            let local = property.get("localType").and_then(Value::as_str).unwrap_or(raw_type);
            Some(json!({ "name": name, "alias": name, "type": field_type(local) }))
        })
        .collect()
}

/// Maps an XSD type name to an outfield type.
fn field_type(xsd_type: &str) -> &'static str {
    let local = xsd_type.rsplit(':').next().unwrap_or(xsd_type).to_ascii_lowercase();
    match local.as_str() {
        "int" | "integer" | "long" | "short" | "double" | "float" | "decimal" | "number" => "number",
        "date" | "datetime" | "date-time" => "date",
        _ => "string",
    }
}

/// Finds a feature type by name, ignoring a namespace prefix.
fn find_feature_type<'a>(capabilities: &'a Value, layer_id: &LayerId) -> Option<&'a Value> {
    capabilities.get("featureTypes").and_then(Value::as_array)?.iter().find(|feature_type| {
        feature_type.get("name").and_then(Value::as_str).is_some_and(|name| same_layer_name(name, layer_id))
    })
}
