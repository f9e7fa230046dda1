// crates/geoview-config/src/metadata/wms.rs
// ============================================================================
// Module: WMS Metadata
// Description: WMS GetCapabilities parsing and layer lookup.
// Purpose: Convert capabilities XML into a JSON layer tree and overlays.
// Dependencies: geoview-core, roxmltree, serde_json
// ============================================================================

//! ## Overview
//! Capabilities are parsed once per root into
//! `{ "version", "layers": [ { name, title, queryable, minScaleDenominator,
//! maxScaleDenominator, styles, dimension, layers } ] }`. Leaves look up
//! their layer by `Name` anywhere in that tree; a named layer with named
//! children is a metadata group.

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
use super::SubLayer;
use super::child_element;
use super::child_text;
use super::same_layer_name;
use super::with_query;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// GetCapabilities query parameters.
const CAPABILITIES_QUERY: &str = "service=WMS&version=1.3.0&request=GetCapabilities";
/// Root element of a WMS exception document.
const EXCEPTION_ROOT: &str = "ServiceExceptionReport";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Capabilities request for a WMS endpoint.
pub(super) fn service_request(metadata_access_path: &str) -> MetadataRequest {
    MetadataRequest::text(with_query(metadata_access_path, CAPABILITIES_QUERY))
}

/// WMS leaves read everything from the capabilities.
pub(super) fn leaf_plan(layer_id: &LayerId, service_metadata: Option<&Value>) -> LeafMetadataPlan {
    match service_metadata {
        None => LeafMetadataPlan::None,
        Some(capabilities) if find_layer(capabilities, layer_id).is_some() => LeafMetadataPlan::FromService,
        Some(_) => LeafMetadataPlan::NotFound(format!("layer {layer_id} is not in the capabilities")),
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a capabilities document into its JSON layer tree.
pub(super) fn parse_capabilities(xml: &str) -> Result<Value, FetchError> {
    let document = roxmltree::Document::parse(xml).map_err(|err| FetchError::Parse(err.to_string()))?;
    let root = document.root_element();
    if root.tag_name().name() == EXCEPTION_ROOT {
        let message = root
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "ServiceException")
            .and_then(|node| node.text())
            .map_or_else(|| "service exception".to_string(), |text| text.trim().to_string());
        return Err(FetchError::Provider(message));
    }
    let layers: Vec<Value> = child_element(root, "Capability")
        .into_iter()
        .flat_map(|capability| capability.children())
        .filter(|node| node.is_element() && node.tag_name().name() == "Layer")
        .map(parse_layer)
        .collect();
    Ok(json!({
        "version": root.attribute("version").unwrap_or_default(),
        "layers": layers,
    }))
}

/// Parses one `Layer` element and its children.
fn parse_layer(node: roxmltree::Node<'_, '_>) -> Value {
    let mut layer = Map::new();
    if let Some(name) = child_text(node, "Name") {
        layer.insert("name".to_string(), Value::from(name));
    }
    if let Some(title) = child_text(node, "Title") {
        layer.insert("title".to_string(), Value::from(title));
    }
    let queryable = node.attribute("queryable").is_some_and(|flag| flag == "1" || flag == "true");
    layer.insert("queryable".to_string(), Value::from(queryable));
    for (element, key) in [
        ("MinScaleDenominator", "minScaleDenominator"),
        ("MaxScaleDenominator", "maxScaleDenominator"),
    ] {
        if let Some(scale) = child_text(node, element).and_then(|text| text.parse::<f64>().ok()) {
            layer.insert(key.to_string(), Value::from(scale));
        }
    }
    let styles: Vec<Value> = node
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == "Style")
        .filter_map(|style| child_text(style, "Name"))
        .map(Value::from)
        .collect();
    layer.insert("styles".to_string(), Value::Array(styles));
    if let Some(dimension) = node.children().find(|child| {
        child.is_element()
            && child.tag_name().name() == "Dimension"
            && child.attribute("name").is_some_and(|name| name.eq_ignore_ascii_case("time"))
    }) {
        layer.insert(
            "dimension".to_string(),
            json!({
                "name": dimension.attribute("name").unwrap_or("time"),
                "default": dimension.attribute("default"),
                "values": dimension.text().map(str::trim).unwrap_or_default(),
            }),
        );
    }
    let children: Vec<Value> = node
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == "Layer")
        .map(parse_layer)
        .collect();
    layer.insert("layers".to_string(), Value::Array(children));
    Value::Object(layer)
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Interprets the capabilities entry of a leaf.
pub(super) fn interpret(layer_id: &LayerId, service_metadata: Option<&Value>) -> LeafMetadataOutcome {
    let Some(capabilities) = service_metadata else {
        return LeafMetadataOutcome::Overlay(Value::Null);
    };
    let Some(layer) = find_layer(capabilities, layer_id) else {
        return LeafMetadataOutcome::NotFound(format!("layer {layer_id} is not in the capabilities"));
    };
    let children: Vec<SubLayer> = layer
        .get("layers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|child| {
            Some(SubLayer {
                layer_id: LayerId::new(child.get("name").and_then(Value::as_str)?),
                layer_name: child.get("title").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect();
    if !children.is_empty() {
        return LeafMetadataOutcome::Group(children);
    }
    LeafMetadataOutcome::Overlay(layer_overlay(layer))
}

/// Builds the overlay of one capabilities layer.
fn layer_overlay(layer: &Value) -> Value {
    let mut overlay = Map::new();
    if let Some(title) = layer.get("title").and_then(Value::as_str) {
        overlay.insert("layerName".to_string(), Value::from(title));
    }
    if let Some(scale) = layer.get("maxScaleDenominator").and_then(Value::as_f64) {
        overlay.insert("minScale".to_string(), Value::from(scale));
    }
    if let Some(scale) = layer.get("minScaleDenominator").and_then(Value::as_f64) {
        overlay.insert("maxScale".to_string(), Value::from(scale));
    }
    let queryable = layer.get("queryable").and_then(Value::as_bool).unwrap_or(false);
    let mut source = json!({ "featureInfo": { "queryable": queryable } });
    if let Some(style) = layer.get("styles").and_then(Value::as_array).and_then(|styles| styles.first())
        && let Some(map) = source.as_object_mut()
    {
        map.insert("wmsStyle".to_string(), style.clone());
    }
    overlay.insert("source".to_string(), source);
    if let Some(dimension) = layer.get("dimension") {
        let range: Vec<Value> = dimension
            .get("values")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Value::from)
            .collect();
        let mut temporal = json!({
            "field": dimension.get("name").and_then(Value::as_str).unwrap_or("time"),
            "range": range,
            "singleHandle": false,
        });
        if let Some(default) = dimension.get("default").and_then(Value::as_str)
            && let Some(map) = temporal.as_object_mut()
        {
            map.insert("default".to_string(), Value::from(default));
        }
        overlay.insert("temporalDimension".to_string(), temporal);
    }
    Value::Object(overlay)
}

/// Finds a named layer anywhere in the capabilities tree.
fn find_layer<'a>(capabilities: &'a Value, layer_id: &LayerId) -> Option<&'a Value> {
    let mut stack: Vec<&Value> =
        capabilities.get("layers").and_then(Value::as_array).into_iter().flatten().collect();
    while let Some(layer) = stack.pop() {
        if layer.get("name").and_then(Value::as_str).is_some_and(|name| same_layer_name(name, layer_id)) {
            return Some(layer);
        }
        stack.extend(layer.get("layers").and_then(Value::as_array).into_iter().flatten());
    }
    None
}
