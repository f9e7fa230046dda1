// crates/geoview-core/src/core/tree/tests.rs
// ============================================================================
// Module: Layer Tree Tests
// Description: Unit tests for arena links, path derivation, and serialization.
// Purpose: Ensure layer paths are derived from ancestors and never diverge.
// Dependencies: geoview-core
// ============================================================================

//! ## Overview
//! Exercises root insertion, child attachment, traversal order, lookups, and
//! nested JSON output of [`LayerTree`].

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

use serde_json::json;

use super::LayerTree;
use super::TreeError;
use crate::core::entry::EntryConfig;
use crate::core::entry::GroupConfig;
use crate::core::entry::LayerEntryErrorKind;
use crate::core::entry::LeafConfig;
use crate::core::identifiers::GeoviewLayerId;
use crate::core::identifiers::LayerId;
use crate::core::identifiers::LayerPath;
use crate::core::layer_types::GeoviewLayerType;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn leaf(id: &str) -> EntryConfig {
    EntryConfig::new_leaf(LayerId::from(id), LeafConfig::empty(GeoviewLayerType::EsriFeature), json!({}))
}

fn group(id: &str) -> EntryConfig {
    EntryConfig::new_group(LayerId::from(id), GroupConfig::default(), json!({}))
}

fn sample_tree() -> LayerTree {
    let mut tree = LayerTree::new(GeoviewLayerId::from("gv"));
    let g = tree.insert_root(group("g"));
    tree.attach(g, leaf("0")).unwrap();
    let inner = tree.attach(g, group("inner")).unwrap();
    tree.attach(inner, leaf("1")).unwrap();
    tree.insert_root(leaf("2"));
    tree
}

// ============================================================================
// SECTION: Path Derivation
// ============================================================================

#[test]
fn root_paths_start_with_geoview_layer_id() {
    let mut tree = LayerTree::new(GeoviewLayerId::from("gv"));
    let id = tree.insert_root(leaf("7"));
    assert_eq!(tree.get(id).unwrap().layer_path().as_str(), "gv/7");
    assert_eq!(tree.get(id).unwrap().layer_path().geoview_layer_segment(), "gv");
}

#[test]
fn attached_children_extend_parent_path() {
    let tree = sample_tree();
    let paths: Vec<&str> = tree.iter().map(|(_, node)| node.layer_path().as_str()).collect();
    assert_eq!(paths, vec!["gv/g", "gv/g/0", "gv/g/inner", "gv/g/inner/1", "gv/2"]);
    for (id, node) in tree.iter() {
        if let Some(parent) = tree.parent(id) {
            let parent_path = tree.get(parent).unwrap().layer_path();
            assert!(node.layer_path().is_descendant_of(parent_path));
        }
    }
}

#[test]
fn attach_rejects_leaf_parent() {
    let mut tree = LayerTree::new(GeoviewLayerId::from("gv"));
    let parent = tree.insert_root(leaf("0"));
    let err = tree.attach(parent, leaf("1")).unwrap_err();
    assert_eq!(err, TreeError::NotAGroup(LayerPath::parse("gv/0")));
}

#[test]
fn converted_metadata_group_accepts_children() {
    let mut tree = LayerTree::new(GeoviewLayerId::from("gv"));
    let id = tree.insert_root(leaf("5"));
    tree.get_mut(id).unwrap().convert_to_metadata_group();
    let child = tree.attach(id, leaf("6")).unwrap();
    assert_eq!(tree.get(child).unwrap().layer_path().as_str(), "gv/5/6");
    assert!(tree.get(id).unwrap().as_group().unwrap().is_metadata_layer_group);
}

// ============================================================================
// SECTION: Traversal
// ============================================================================

#[test]
fn leaf_ids_and_bottom_up_groups_follow_tree_order() {
    let tree = sample_tree();
    let leaves: Vec<&str> =
        tree.leaf_ids().into_iter().map(|id| tree.get(id).unwrap().layer_id.as_str()).collect();
    assert_eq!(leaves, vec!["0", "1", "2"]);
    let groups: Vec<&str> = tree
        .groups_bottom_up()
        .into_iter()
        .map(|id| tree.get(id).unwrap().layer_id.as_str())
        .collect();
    assert_eq!(groups, vec!["inner", "g"]);
}

#[test]
fn find_by_path_locates_nested_nodes() {
    let tree = sample_tree();
    let id = tree.find_by_path(&LayerPath::parse("gv/g/inner/1")).unwrap();
    assert_eq!(tree.get(id).unwrap().layer_id.as_str(), "1");
    assert!(tree.find_by_path(&LayerPath::parse("gv/missing")).is_none());
}

// ============================================================================
// SECTION: Serialization
// ============================================================================

#[test]
fn to_json_nests_children_and_hides_metadata() {
    let mut tree = sample_tree();
    let leaf_id = tree.find_by_path(&LayerPath::parse("gv/g/0")).unwrap();
    tree.get_mut(leaf_id).unwrap().set_metadata(Some(json!({"secret": true})));
    let value = tree.to_json().unwrap();
    let roots = value.as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["entryType"], "group");
    assert_eq!(roots[0]["listOfLayerEntryConfig"][0]["layerPath"], "gv/g/0");
    assert_eq!(roots[0]["listOfLayerEntryConfig"][1]["listOfLayerEntryConfig"][0]["layerId"], "1");
    assert!(!value.to_string().contains("secret"));
}

#[test]
fn marked_errors_are_serialized_with_flag() {
    let mut tree = sample_tree();
    let id = tree.find_by_path(&LayerPath::parse("gv/2")).unwrap();
    let node = tree.get_mut(id).unwrap();
    node.mark_error(LayerEntryErrorKind::MetadataFetch, "boom");
    node.mark_error(LayerEntryErrorKind::SchemaViolation, "ignored");
    assert_eq!(node.error().unwrap().kind, LayerEntryErrorKind::MetadataFetch);
    let value = tree.to_json().unwrap();
    assert_eq!(value[1]["isLayerEntryError"], true);
    assert_eq!(value[1]["layerStatus"], "error");
    assert_eq!(value[1]["error"]["kind"], "metadata_fetch");
}

#[test]
fn depth_counts_ancestors() {
    let tree = sample_tree();
    let nested = tree.find_by_path(&LayerPath::parse("gv/g/inner/1")).unwrap();
    let root = tree.find_by_path(&LayerPath::parse("gv/2")).unwrap();
    assert_eq!(tree.depth(nested), 3);
    assert_eq!(tree.depth(root), 1);
}

#[test]
fn errors_recorded_before_insertion_follow_the_derived_path() {
    let mut tree = LayerTree::new(GeoviewLayerId::from("gv"));
    let g = tree.insert_root(group("g"));
    let mut entry = leaf("9");
    entry.mark_error(LayerEntryErrorKind::MissingField, "no path");
    let id = tree.attach(g, entry).unwrap();
    assert_eq!(tree.get(id).unwrap().error().unwrap().layer_path.as_str(), "gv/g/9");
}
