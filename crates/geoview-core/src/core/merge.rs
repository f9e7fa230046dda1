// crates/geoview-core/src/core/merge.rs
// ============================================================================
// Module: Default Layering
// Description: Pure three-stage merge of hard defaults, metadata, and user input.
// Purpose: Compute effective entry settings with a single, uniform precedence.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Effective settings are always recomputed from scratch as
//! `merge_layers(hard_defaults, metadata_overlay, user_input)`. Later layers win:
//! user input overrides metadata, metadata overrides hard defaults. Objects merge
//! key by key, arrays and scalars replace, and `null` never overrides a value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges the three default layers with user input taking precedence.
#[must_use]
pub fn merge_layers(hard_defaults: &Value, metadata_overlay: &Value, user_input: &Value) -> Value {
    let mut merged = hard_defaults.clone();
    deep_merge(&mut merged, metadata_overlay);
    deep_merge(&mut merged, user_input);
    merged
}

/// Merges `overlay` into `base` in place.
///
/// Nested objects are merged recursively. Any other overlay value replaces the
/// base value, except `null`, which leaves the base untouched.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => merge_maps(base_map, overlay_map),
        (slot, value) => *slot = value.clone(),
    }
}

/// Merges object entries key by key.
fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if value.is_null() {
            continue;
        }
        match (base.get_mut(key), value) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => merge_maps(base_obj, overlay_obj),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
