// crates/geoview-core/src/core/entry.rs
// ============================================================================
// Module: GeoView Entry Configs
// Description: Leaf and group nodes of a geoview layer tree.
// Purpose: Hold identity, layered settings, status, and error flags per node.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`EntryConfig`] is one addressable node of a layer tree. The node body is
//! a closed sum type: [`EntryBody::Leaf`] carries the layered source settings
//! of one data source, [`EntryBody::Group`] carries ordered child links.
//! Fetched metadata and the original user JSON are private to the node and are
//! never serialized.
//!
//! Invariants:
//! - `layer_path` is only written by [`crate::LayerTree`].
//! - A failed node keeps its place in the tree; it is marked, never removed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::LayerId;
use crate::core::identifiers::LayerPath;
use crate::core::identifiers::NodeId;
use crate::core::layer_types::EntryType;
use crate::core::layer_types::GROUP_SCHEMA_PATH;
use crate::core::layer_types::GeoviewLayerType;
use crate::core::layer_types::LayerStatus;
use crate::core::source::InitialSettings;
use crate::core::source::SourceConfig;
use crate::core::source::TemporalDimension;

// ============================================================================
// SECTION: Entry Errors
// ============================================================================

/// Category of a node-level failure.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerEntryErrorKind {
    /// Raw user JSON failed its input schema fragment.
    SchemaViolation,
    /// The resolved node failed its internal schema fragment.
    InternalSchemaViolation,
    /// Metadata could not be fetched or parsed.
    MetadataFetch,
    /// A mandatory field was missing at construction time.
    MissingField,
    /// A group ended up with no successfully constructed child.
    EmptyGroup,
    /// The service metadata does not list the requested layer.
    LayerNotFound,
    /// The entry could not be interpreted at all.
    MalformedEntry,
    /// Resolution was aborted.
    Cancelled,
}

impl LayerEntryErrorKind {
    /// Returns the stable error code for this error kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema_violation",
            Self::InternalSchemaViolation => "internal_schema_violation",
            Self::MetadataFetch => "metadata_fetch_failed",
            Self::MissingField => "missing_field",
            Self::EmptyGroup => "empty_group",
            Self::LayerNotFound => "layer_not_found",
            Self::MalformedEntry => "malformed_entry",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true when the failure should be reported to users.
    #[must_use]
    pub const fn is_reportable(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Node-level failure recorded on an entry and reported through callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{layer_path}: {} ({message})", kind.code())]
#[serde(rename_all = "camelCase")]
pub struct LayerEntryError {
    /// Path of the failed node (or the geoview layer id for root failures).
    pub layer_path: LayerPath,
    /// Failure category.
    pub kind: LayerEntryErrorKind,
    /// Human readable details.
    pub message: String,
}

impl LayerEntryError {
    /// Creates a new entry error.
    #[must_use]
    pub fn new(layer_path: LayerPath, kind: LayerEntryErrorKind, message: impl Into<String>) -> Self {
        Self {
            layer_path,
            kind,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Node Bodies
// ============================================================================

/// Layered settings of a leaf (one renderable data source).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafConfig {
    /// Source format; fixes the entry type and schema path.
    #[serde(skip)]
    pub format: GeoviewLayerType,
    /// Source settings.
    pub source: SourceConfig,
    /// Opaque style definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    /// Attribute filter expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_filter: Option<String>,
    /// Minimum scale denominator at which the layer is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,
    /// Maximum scale denominator at which the layer is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f64>,
    /// Time dimension for time-aware layers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_dimension: Option<TemporalDimension>,
}

impl LeafConfig {
    /// Creates an empty leaf body for a format.
    #[must_use]
    pub fn empty(format: GeoviewLayerType) -> Self {
        Self {
            format,
            source: SourceConfig::default(),
            style: None,
            layer_filter: None,
            min_scale: None,
            max_scale: None,
            temporal_dimension: None,
        }
    }
}

/// Child links and aggregates of a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    /// Ordered children; serialized by [`crate::LayerTree::to_json`].
    #[serde(skip)]
    pub children: Vec<NodeId>,
    /// True when the group mirrors a service-side layer group.
    pub is_metadata_layer_group: bool,
    /// Smallest child minimum scale, computed after children resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f64>,
    /// Largest child maximum scale, computed after children resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f64>,
}

/// Node body: a leaf or a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryBody {
    /// Renderable data source.
    Leaf(LeafConfig),
    /// Collection of child entries.
    Group(GroupConfig),
}

// ============================================================================
// SECTION: Entry Config
// ============================================================================

/// One node of a geoview layer tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryConfig {
    /// Identifier, unique among siblings.
    pub layer_id: LayerId,
    /// Derived path; written only by the tree.
    pub(crate) layer_path: LayerPath,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_name: Option<String>,
    /// Entry type tag.
    entry_type: EntryType,
    /// Schema path validating this node.
    schema_tag: &'static str,
    /// Resolution status.
    layer_status: LayerStatus,
    /// Mirror of `error.is_some()` for consumers of the serialized tree.
    is_layer_entry_error: bool,
    /// Recorded failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<LayerEntryError>,
    /// Display settings cascaded from the parent.
    pub initial_settings: InitialSettings,
    /// Leaf or group body.
    #[serde(flatten)]
    pub body: EntryBody,
    /// Parent link.
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
    /// Fetched service metadata for this node.
    #[serde(skip)]
    metadata: Option<Value>,
    /// Raw user JSON the node was built from.
    #[serde(skip)]
    user_input: Value,
}

impl EntryConfig {
    /// Creates a leaf node. The layer path is assigned when it is inserted.
    #[must_use]
    pub fn new_leaf(layer_id: LayerId, leaf: LeafConfig, user_input: Value) -> Self {
        let entry_type = leaf.format.leaf_entry_type().unwrap_or(EntryType::GeoCore);
        let schema_tag = leaf.format.leaf_schema_path();
        Self::new(layer_id, entry_type, schema_tag, EntryBody::Leaf(leaf), user_input)
    }

    /// Creates a group node. The layer path is assigned when it is inserted.
    #[must_use]
    pub fn new_group(layer_id: LayerId, group: GroupConfig, user_input: Value) -> Self {
        Self::new(layer_id, EntryType::Group, GROUP_SCHEMA_PATH, EntryBody::Group(group), user_input)
    }

    /// Shared constructor.
    fn new(
        layer_id: LayerId,
        entry_type: EntryType,
        schema_tag: &'static str,
        body: EntryBody,
        user_input: Value,
    ) -> Self {
        Self {
            layer_path: LayerPath::parse(layer_id.as_str()),
            layer_id,
            layer_name: None,
            entry_type,
            schema_tag,
            layer_status: LayerStatus::Registered,
            is_layer_entry_error: false,
            error: None,
            initial_settings: InitialSettings::default(),
            body,
            parent: None,
            metadata: None,
            user_input,
        }
    }

    /// Returns the derived layer path.
    #[must_use]
    pub const fn layer_path(&self) -> &LayerPath {
        &self.layer_path
    }

    /// Sets the derived path, keeping a recorded failure in sync.
    pub(crate) fn set_layer_path(&mut self, layer_path: LayerPath) {
        if let Some(error) = &mut self.error {
            error.layer_path = layer_path.clone();
        }
        self.layer_path = layer_path;
    }

    /// Returns the entry type tag.
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Returns the schema path validating this node.
    #[must_use]
    pub const fn schema_path(&self) -> &'static str {
        self.schema_tag
    }

    /// Returns the parent link.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the resolution status.
    #[must_use]
    pub const fn layer_status(&self) -> LayerStatus {
        self.layer_status
    }

    /// Sets a non-error status. Errored nodes keep their terminal status.
    pub fn set_status(&mut self, status: LayerStatus) {
        if self.error.is_none() {
            self.layer_status = status;
        }
    }

    /// Returns true when the node is marked as failed or cancelled.
    #[must_use]
    pub const fn is_layer_entry_error(&self) -> bool {
        self.is_layer_entry_error
    }

    /// Returns the recorded failure.
    #[must_use]
    pub const fn error(&self) -> Option<&LayerEntryError> {
        self.error.as_ref()
    }

    /// Marks the node as failed. The first recorded failure wins.
    pub fn mark_error(&mut self, kind: LayerEntryErrorKind, message: impl Into<String>) {
        if self.error.is_some() {
            return;
        }
        self.layer_status = if kind == LayerEntryErrorKind::Cancelled {
            LayerStatus::Cancelled
        } else {
            LayerStatus::Error
        };
        self.is_layer_entry_error = true;
        self.error = Some(LayerEntryError::new(self.layer_path.clone(), kind, message));
    }

    /// Returns the fetched metadata, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Replaces the fetched metadata.
    pub fn set_metadata(&mut self, metadata: Option<Value>) {
        self.metadata = metadata;
    }

    /// Returns the raw user JSON the node was built from.
    #[must_use]
    pub const fn user_input(&self) -> &Value {
        &self.user_input
    }

    /// Returns the leaf body, if this node is a leaf.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&LeafConfig> {
        match &self.body {
            EntryBody::Leaf(leaf) => Some(leaf),
            EntryBody::Group(_) => None,
        }
    }

    /// Returns the mutable leaf body, if this node is a leaf.
    pub const fn as_leaf_mut(&mut self) -> Option<&mut LeafConfig> {
        match &mut self.body {
            EntryBody::Leaf(leaf) => Some(leaf),
            EntryBody::Group(_) => None,
        }
    }

    /// Returns the group body, if this node is a group.
    #[must_use]
    pub const fn as_group(&self) -> Option<&GroupConfig> {
        match &self.body {
            EntryBody::Group(group) => Some(group),
            EntryBody::Leaf(_) => None,
        }
    }

    /// Returns true when the node is a group.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self.body, EntryBody::Group(_))
    }

    /// Turns a leaf into a metadata group, keeping identity and settings.
    ///
    /// Used when service metadata reveals that a configured layer is a
    /// service-side group.
    pub fn convert_to_metadata_group(&mut self) {
        self.entry_type = EntryType::Group;
        self.schema_tag = GROUP_SCHEMA_PATH;
        self.body = EntryBody::Group(GroupConfig {
            is_metadata_layer_group: true,
            ..GroupConfig::default()
        });
    }
}
