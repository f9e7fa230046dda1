// crates/geoview-core/src/core/tree.rs
// ============================================================================
// Module: GeoView Layer Tree
// Description: Arena-backed tree of entry configs owned by one geoview layer.
// Purpose: Own every node, derive layer paths, and serialize the nested tree.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`LayerTree`] owns its nodes in a flat arena and links them with
//! [`NodeId`] indices. Root order is the initial z-order of the geoview layer.
//! Layer paths are assigned here and nowhere else: inserting a root derives
//! `<geoviewLayerId>/<layerId>`, attaching a child derives `<parent>/<layerId>`
//! and recomputes the whole attached subtree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::entry::EntryBody;
use crate::core::entry::EntryConfig;
use crate::core::identifiers::GeoviewLayerId;
use crate::core::identifiers::LayerPath;
use crate::core::identifiers::NodeId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural errors raised by tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Node id does not belong to this tree.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    /// Children can only be attached below groups.
    #[error("node is not a group: {0}")]
    NotAGroup(LayerPath),
}

// ============================================================================
// SECTION: Layer Tree
// ============================================================================

/// Arena of entry configs with ordered roots.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTree {
    /// Owning geoview layer id; first segment of every path.
    geoview_layer_id: GeoviewLayerId,
    /// Node storage indexed by [`NodeId`].
    nodes: Vec<EntryConfig>,
    /// Top-level entries in z-order.
    roots: Vec<NodeId>,
}

impl LayerTree {
    /// Creates an empty tree for a geoview layer.
    #[must_use]
    pub const fn new(geoview_layer_id: GeoviewLayerId) -> Self {
        Self {
            geoview_layer_id,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Returns the owning geoview layer id.
    #[must_use]
    pub const fn geoview_layer_id(&self) -> &GeoviewLayerId {
        &self.geoview_layer_id
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the root node ids in z-order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Inserts a top-level entry and derives its path.
    pub fn insert_root(&mut self, mut entry: EntryConfig) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        entry.parent = None;
        entry.set_layer_path(LayerPath::root(&self.geoview_layer_id, &entry.layer_id));
        self.nodes.push(entry);
        self.roots.push(id);
        id
    }

    /// Attaches an entry as the last child of a group and derives its path.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when the parent is unknown or not a group.
    pub fn attach(&mut self, parent: NodeId, mut entry: EntryConfig) -> Result<NodeId, TreeError> {
        let id = NodeId::from_index(self.nodes.len());
        let parent_node = self.nodes.get_mut(parent.index()).ok_or(TreeError::UnknownNode(parent))?;
        let EntryBody::Group(group) = &mut parent_node.body else {
            return Err(TreeError::NotAGroup(parent_node.layer_path.clone()));
        };
        group.children.push(id);
        entry.parent = Some(parent);
        entry.set_layer_path(parent_node.layer_path.child(&entry.layer_id));
        self.nodes.push(entry);
        self.recompute_paths(id);
        Ok(id)
    }

    /// Recomputes the paths of every descendant of `id` from its own path.
    fn recompute_paths(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.index()) else {
                continue;
            };
            let path = node.layer_path.clone();
            for child in self.children(current).to_vec() {
                if let Some(child_node) = self.nodes.get_mut(child.index()) {
                    let child_path = path.child(&child_node.layer_id);
                    child_node.set_layer_path(child_path);
                    stack.push(child);
                }
            }
        }
    }

    /// Returns a node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&EntryConfig> {
        self.nodes.get(id.index())
    }

    /// Returns a mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut EntryConfig> {
        self.nodes.get_mut(id.index())
    }

    /// Returns the ordered children of a node; empty for leaves.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id).map(|node| &node.body) {
            Some(EntryBody::Group(group)) => &group.children,
            _ => &[],
        }
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(EntryConfig::parent)
    }

    /// Returns the nesting depth of a node; roots have depth 1.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.get(id)) {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Finds a node by its layer path.
    #[must_use]
    pub fn find_by_path(&self, path: &LayerPath) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| &node.layer_path == path)
            .map(NodeId::from_index)
    }

    /// Iterates nodes in pre-order, roots first in z-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &EntryConfig)> + '_ {
        self.pre_order().into_iter().filter_map(|id| self.get(id).map(|node| (id, node)))
    }

    /// Returns every node id in pre-order.
    #[must_use]
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            order.push(*root);
            order.extend(self.descendants(*root));
        }
        order
    }

    /// Returns every descendant of a node in pre-order, excluding the node.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Returns the ids of every leaf in pre-order.
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.pre_order()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|node| !node.is_group()))
            .collect()
    }

    /// Returns the ids of every group in post-order (children before parents).
    #[must_use]
    pub fn groups_bottom_up(&self) -> Vec<NodeId> {
        let mut order: Vec<NodeId> = self
            .pre_order()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(EntryConfig::is_group))
            .collect();
        order.reverse();
        order
    }

    /// Serializes the roots as a nested `listOfLayerEntryConfig` array.
    ///
    /// Fetched metadata and user input are never included.
    ///
    /// # Errors
    ///
    /// Returns an error when a node fails to serialize.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let list = self
            .roots
            .iter()
            .map(|id| self.node_to_json(*id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(list))
    }

    /// Serializes one node and its subtree.
    fn node_to_json(&self, id: NodeId) -> Result<Value, serde_json::Error> {
        let Some(node) = self.get(id) else {
            return Ok(Value::Null);
        };
        let mut value = serde_json::to_value(node)?;
        if node.is_group() {
            let children = self
                .children(id)
                .iter()
                .map(|child| self.node_to_json(*child))
                .collect::<Result<Vec<_>, _>>()?;
            if let Value::Object(map) = &mut value {
                map.insert("listOfLayerEntryConfig".to_string(), Value::Array(children));
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests;
