// crates/geoview-config/src/metadata/ogc_api.rs
// ============================================================================
// Module: OGC API Features Metadata
// Description: Collection listing and queryables handling.
// Purpose: Resolve collection titles and outfields for OGC API leaves.
// Dependencies: geoview-core, serde_json
// ============================================================================

//! ## Overview
//! The service document is `<root>/collections?f=json`; each leaf fetches
//! `<root>/collections/<id>/queryables?f=json`. Queryables are a JSON schema
//! whose `properties` become outfields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::LayerId;
use geoview_core::MetadataRequest;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::LeafMetadataOutcome;
use super::LeafMetadataPlan;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Collection listing request.
pub(super) fn service_request(metadata_access_path: &str) -> MetadataRequest {
    MetadataRequest::json(format!("{}/collections?f=json", api_root(metadata_access_path)))
}

/// Decides the queryables fetch of a leaf.
pub(super) fn leaf_plan(
    layer_id: &LayerId,
    base: Option<&str>,
    service_metadata: Option<&Value>,
) -> LeafMetadataPlan {
    if let Some(collections) = service_metadata.and_then(collection_list)
        && !collections.iter().any(|collection| is_collection(collection, layer_id))
    {
        return LeafMetadataPlan::NotFound(format!("collection {layer_id} is not published"));
    }
    let Some(base) = base else {
        return LeafMetadataPlan::None;
    };
    LeafMetadataPlan::Fetch(MetadataRequest::json(format!(
        "{}/collections/{layer_id}/queryables?f=json",
        api_root(base)
    )))
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Interprets the collection entry and queryables of a leaf.
pub(super) fn interpret(
    layer_id: &LayerId,
    leaf_metadata: Option<&Value>,
    service_metadata: Option<&Value>,
) -> LeafMetadataOutcome {
    let mut overlay = Map::new();
    if let Some(collections) = service_metadata.and_then(collection_list) {
        let Some(collection) = collections.iter().find(|collection| is_collection(collection, layer_id))
        else {
            return LeafMetadataOutcome::NotFound(format!("collection {layer_id} is not published"));
        };
        if let Some(title) = collection.get("title").and_then(Value::as_str) {
            overlay.insert("layerName".to_string(), Value::from(title));
        }
    }
    if let Some(queryables) = leaf_metadata {
        overlay.insert(
            "source".to_string(),
            json!({ "featureInfo": { "outfields": outfields(queryables) } }),
        );
    }
    LeafMetadataOutcome::Overlay(Value::Object(overlay))
}

/// Reads outfields from a queryables schema.
fn outfields(queryables: &Value) -> Vec<Value> {
    queryables
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(_, property)| !is_geometry(property))
        .map(|(name, property)| {
            let alias = property.get("title").and_then(Value::as_str).unwrap_or(name);
            json!({ "name": name, "alias": alias, "type": field_type(property) })
        })
        .collect()
}

/// Returns true for geometry queryables.
fn is_geometry(property: &Value) -> bool {
    let format = property.get("format").and_then(Value::as_str).unwrap_or_default();
    let reference = property.get("$ref").and_then(Value::as_str).unwrap_or_default();
    format.starts_with("geometry") || reference.contains("geojson") || reference.contains("geometry")
}

/// Maps a queryable schema to an outfield type.
fn field_type(property: &Value) -> &'static str {
    let kind = property.get("type").and_then(Value::as_str).unwrap_or_default();
    let format = property.get("format").and_then(Value::as_str).unwrap_or_default();
    match (kind, format) {
        ("integer" | "number", _) => "number",
        (_, "date" | "date-time") => "date",
        (_, "uri") => "url",
        _ => "string",
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Strips a trailing `/collections` segment and slashes.
fn api_root(path: &str) -> &str {
    let trimmed = path.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    if let Some(index) = lower.find("/collections") {
        return &trimmed[..index];
    }
    trimmed
}

/// Returns the `collections` array of a listing.
fn collection_list(listing: &Value) -> Option<&Vec<Value>> {
    listing.get("collections").and_then(Value::as_array)
}

/// Returns true when a collection entry has the leaf's id.
fn is_collection(collection: &Value, layer_id: &LayerId) -> bool {
    collection.get("id").and_then(Value::as_str) == Some(layer_id.as_str())
}
