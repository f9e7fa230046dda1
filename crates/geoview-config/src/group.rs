// crates/geoview-config/src/group.rs
// ============================================================================
// Module: Group Construction
// Description: Builds entry subtrees from raw `listOfLayerEntryConfig` arrays.
// Purpose: Instantiate leaves and groups in order without aborting siblings.
// Dependencies: geoview-core, serde_json
// ============================================================================

//! ## Overview
//! [`build_entries`] turns one raw array into ordered children of a parent.
//! Every element produces exactly one node: failures become errored
//! placeholders so the tree keeps the shape of the user config. Groups are
//! recognized by `entryType == "group"` or by an own
//! `listOfLayerEntryConfig` array. After children resolve,
//! [`compute_group_aggregates`] folds their scale envelope into each group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use geoview_core::EntryBody;
use geoview_core::EntryConfig;
use geoview_core::EntryType;
use geoview_core::GROUP_SCHEMA_PATH;
use geoview_core::GeoviewLayerType;
use geoview_core::GroupConfig;
use geoview_core::InitialSettings;
use geoview_core::LAYER_PATH_SEPARATOR;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerId;
use geoview_core::LayerTree;
use geoview_core::LeafConfig;
use geoview_core::NodeId;
use serde_json::Value;
use serde_json::json;

use crate::error::ConfigError;
use crate::leaf::LeafContext;
use crate::leaf::build_leaf;
use crate::leaf::cascade_initial_settings;
use crate::leaf::parse_layer_id;
use crate::metadata::SubLayer;
use crate::validator::SchemaValidator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs shared while building one geoview layer tree.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Source format of the owning geoview layer.
    pub format: GeoviewLayerType,
    /// Metadata access path of the owning geoview layer.
    pub metadata_access_path: Option<&'a str>,
    /// Initial settings of the geoview layer, cascaded into root entries.
    pub root_settings: &'a InitialSettings,
    /// Validator for input fragments.
    pub validator: &'a SchemaValidator,
    /// Deepest allowed nesting; roots have depth 1.
    pub max_tree_depth: usize,
}

impl BuildContext<'_> {
    /// Returns the leaf context of this build.
    const fn leaf(&self) -> LeafContext<'_> {
        LeafContext {
            format: self.format,
            metadata_access_path: self.metadata_access_path,
        }
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds one child per raw element below `parent`, or as roots when `None`.
///
/// Element failures are recorded on placeholder nodes and never returned.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `parent` is not a group of `tree`.
pub fn build_entries(
    tree: &mut LayerTree,
    parent: Option<NodeId>,
    raw_list: &[Value],
    context: &BuildContext<'_>,
) -> Result<Vec<NodeId>, ConfigError> {
    let depth = parent.map_or(0, |id| tree.depth(id)) + 1;
    let parent_settings = parent
        .and_then(|id| tree.get(id))
        .map_or_else(|| context.root_settings.clone(), |node| node.initial_settings.clone());
    let mut seen = BTreeSet::new();
    let mut created = Vec::with_capacity(raw_list.len());
    for (index, raw) in raw_list.iter().enumerate() {
        let mut entry = build_element(index, raw, context, &parent_settings);
        if !seen.insert(entry.layer_id.clone()) {
            entry.mark_error(
                LayerEntryErrorKind::MalformedEntry,
                format!("duplicate layerId {} among siblings", entry.layer_id),
            );
        }
        if depth > context.max_tree_depth {
            entry.mark_error(
                LayerEntryErrorKind::MalformedEntry,
                format!("nesting depth {depth} exceeds {}", context.max_tree_depth),
            );
        }
        let is_group = entry.is_group() && !entry.is_layer_entry_error();
        let id = insert(tree, parent, entry)?;
        if is_group {
            let children = raw
                .get("listOfLayerEntryConfig")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let built = build_entries(tree, Some(id), children, context)?;
            mark_empty_group(tree, id, &built);
        }
        created.push(id);
    }
    Ok(created)
}

/// Turns a leaf into a metadata group and builds one child per sub-layer.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `node` does not belong to `tree`.
pub fn expand_metadata_group(
    tree: &mut LayerTree,
    node: NodeId,
    sub_layers: &[SubLayer],
    context: &BuildContext<'_>,
) -> Result<Vec<NodeId>, ConfigError> {
    let entry = tree.get_mut(node).ok_or_else(|| ConfigError::Invalid(format!("unknown node {node}")))?;
    entry.convert_to_metadata_group();
    let raw_children: Vec<Value> = sub_layers
        .iter()
        .map(|sub_layer| match &sub_layer.layer_name {
            Some(name) => json!({ "layerId": sub_layer.layer_id, "layerName": name }),
            None => json!({ "layerId": sub_layer.layer_id }),
        })
        .collect();
    let built = build_entries(tree, Some(node), &raw_children, context)?;
    mark_empty_group(tree, node, &built);
    Ok(built)
}

/// Builds the unlinked node for one raw element.
fn build_element(
    index: usize,
    raw: &Value,
    context: &BuildContext<'_>,
    parent_settings: &InitialSettings,
) -> EntryConfig {
    if !raw.is_object() {
        return placeholder(
            index,
            raw,
            context.format,
            LayerEntryErrorKind::MalformedEntry,
            "layer entry must be a JSON object",
        );
    }
    let layer_id = match parse_layer_id(raw) {
        Ok(layer_id) => layer_id,
        Err(err) => {
            return placeholder(index, raw, context.format, LayerEntryErrorKind::MissingField, &err.to_string());
        }
    };
    if layer_id.as_str().contains(LAYER_PATH_SEPARATOR) {
        return placeholder(
            index,
            raw,
            context.format,
            LayerEntryErrorKind::MalformedEntry,
            &format!("layerId {layer_id} contains '{LAYER_PATH_SEPARATOR}'"),
        );
    }
    if is_group_element(raw) {
        let mut entry = EntryConfig::new_group(layer_id, GroupConfig::default(), raw.clone());
        entry.initial_settings = cascade_initial_settings(parent_settings, raw);
        if !context.validator.validate(GROUP_SCHEMA_PATH, raw, false) {
            let errors = context.validator.validation_errors(GROUP_SCHEMA_PATH, raw, false);
            entry.mark_error(LayerEntryErrorKind::SchemaViolation, errors.join("; "));
        }
        return entry;
    }
    let schema_path = context.format.leaf_schema_path();
    let schema_errors = if context.validator.validate(schema_path, raw, false) {
        Vec::new()
    } else {
        context.validator.validation_errors(schema_path, raw, false)
    };
    let mut entry = match build_leaf(raw, context.leaf(), parent_settings) {
        Ok(entry) => entry,
        Err(ConfigError::MissingField(field)) => {
            let mut entry = EntryConfig::new_leaf(layer_id, LeafConfig::empty(context.format), raw.clone());
            entry.mark_error(LayerEntryErrorKind::MissingField, format!("missing field {field}"));
            entry
        }
        Err(err) => {
            let mut entry = EntryConfig::new_leaf(layer_id, LeafConfig::empty(context.format), raw.clone());
            entry.mark_error(LayerEntryErrorKind::MalformedEntry, err.to_string());
            entry
        }
    };
    if !schema_errors.is_empty() {
        entry.mark_error(LayerEntryErrorKind::SchemaViolation, schema_errors.join("; "));
    }
    entry
}

/// Builds an errored leaf standing in for an unusable element.
///
/// The element's array index is its id when it has no usable `layerId`. An
/// id containing the path separator is not usable.
fn placeholder(
    index: usize,
    raw: &Value,
    format: GeoviewLayerType,
    kind: LayerEntryErrorKind,
    message: &str,
) -> EntryConfig {
    let layer_id = parse_layer_id(raw)
        .ok()
        .filter(|layer_id| !layer_id.as_str().contains(LAYER_PATH_SEPARATOR))
        .unwrap_or_else(|| LayerId::new(index.to_string()));
    let mut entry = EntryConfig::new_leaf(layer_id, LeafConfig::empty(format), raw.clone());
    entry.mark_error(kind, message);
    entry
}

/// Returns true when a raw element describes a group.
fn is_group_element(raw: &Value) -> bool {
    raw.get("entryType").and_then(Value::as_str) == Some(EntryType::Group.as_str())
        || raw.get("listOfLayerEntryConfig").is_some_and(Value::is_array)
}

/// Links an entry into the tree.
fn insert(tree: &mut LayerTree, parent: Option<NodeId>, entry: EntryConfig) -> Result<NodeId, ConfigError> {
    match parent {
        None => Ok(tree.insert_root(entry)),
        Some(parent) => tree.attach(parent, entry).map_err(|err| ConfigError::Invalid(err.to_string())),
    }
}

/// Marks a group without any constructed child as empty.
fn mark_empty_group(tree: &mut LayerTree, group: NodeId, children: &[NodeId]) {
    let any_built = children
        .iter()
        .any(|child| tree.get(*child).is_some_and(|node| !node.is_layer_entry_error()));
    if any_built {
        return;
    }
    if let Some(node) = tree.get_mut(group) {
        let message = if children.is_empty() {
            "group has no layer entries"
        } else {
            "every layer entry of the group failed"
        };
        node.mark_error(LayerEntryErrorKind::EmptyGroup, message);
    }
}

// ============================================================================
// SECTION: Aggregates
// ============================================================================

/// Computes every group's scale envelope from its non-errored children.
///
/// The envelope is unbounded on a side when any child is unbounded there.
pub fn compute_group_aggregates(tree: &mut LayerTree) {
    for group in tree.groups_bottom_up() {
        let scales: Vec<(Option<f64>, Option<f64>)> = tree
            .children(group)
            .iter()
            .filter_map(|child| tree.get(*child))
            .filter(|node| !node.is_layer_entry_error())
            .map(node_scales)
            .collect();
        let min_scale = envelope(scales.iter().map(|(min, _)| *min), f64::max);
        let max_scale = envelope(scales.iter().map(|(_, max)| *max), f64::min);
        if let Some(EntryBody::Group(config)) = tree.get_mut(group).map(|node| &mut node.body) {
            config.min_scale = min_scale;
            config.max_scale = max_scale;
        }
    }
}

/// Returns the scale pair of a node.
fn node_scales(node: &EntryConfig) -> (Option<f64>, Option<f64>) {
    match &node.body {
        EntryBody::Leaf(leaf) => (leaf.min_scale, leaf.max_scale),
        EntryBody::Group(group) => (group.min_scale, group.max_scale),
    }
}

/// Folds bounded scales; any unbounded (absent or zero) scale wins.
fn envelope(scales: impl Iterator<Item = Option<f64>>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    let mut result: Option<f64> = None;
    for scale in scales {
        let bounded = scale.filter(|value| *value > 0.0)?;
        result = Some(result.map_or(bounded, |current| pick(current, bounded)));
    }
    result
}
