// crates/geoview-config/src/metadata/file.rs
// ============================================================================
// Module: File Metadata
// Description: `.meta` documents for file-based formats.
// Purpose: Use a sibling metadata document as a per-leaf overlay source.
// Dependencies: geoview-core, serde_json
// ============================================================================

//! ## Overview
//! File formats only have metadata when the root's metadata access path names
//! a `.meta` document. That document mirrors a geoview layer config; the
//! entry whose `layerId` matches a leaf, minus its identity, is the leaf's
//! overlay. Leaves without an entry get an empty overlay.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::LayerId;
use geoview_core::MetadataRequest;
use serde_json::Value;

use super::LeafMetadataOutcome;
use crate::paths::is_meta_file;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Keys that identify an entry rather than configure it.
const IDENTITY_KEYS: [&str; 4] = ["layerId", "layerPath", "entryType", "listOfLayerEntryConfig"];

// ============================================================================
// SECTION: Requests
// ============================================================================

/// `.meta` document request, when the path names one.
pub(super) fn service_request(metadata_access_path: &str) -> Option<MetadataRequest> {
    is_meta_file(metadata_access_path).then(|| MetadataRequest::json(metadata_access_path.trim()))
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Builds the overlay of a leaf from the `.meta` document.
pub(super) fn interpret(layer_id: &LayerId, service_metadata: Option<&Value>) -> LeafMetadataOutcome {
    let overlay = service_metadata
        .and_then(|document| find_entry(document, layer_id))
        .and_then(Value::as_object)
        .map(|entry| {
            let mut entry = entry.clone();
            for key in IDENTITY_KEYS {
                entry.remove(key);
            }
            Value::Object(entry)
        })
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    LeafMetadataOutcome::Overlay(overlay)
}

/// Finds the entry with `layer_id` anywhere in the document's entry tree.
fn find_entry<'a>(document: &'a Value, layer_id: &LayerId) -> Option<&'a Value> {
    let mut stack: Vec<&Value> = document
        .get("listOfLayerEntryConfig")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .collect();
    while let Some(entry) = stack.pop() {
        let matches = match entry.get("layerId") {
            Some(Value::String(id)) => id == layer_id.as_str(),
            Some(Value::Number(id)) => id.to_string() == layer_id.as_str(),
            _ => false,
        };
        if matches {
            return Some(entry);
        }
        stack.extend(entry.get("listOfLayerEntryConfig").and_then(Value::as_array).into_iter().flatten());
    }
    None
}
