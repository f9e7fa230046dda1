// crates/geoview-config/src/geoview_layer.rs
// ============================================================================
// Module: Geoview Layer Config
// Description: Root config of one service added to the map.
// Purpose: Own the entry tree and the root-level settings shared by leaves.
// Dependencies: geoview-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`GeoviewLayerConfig`] is built from raw user JSON by dispatching on
//! `geoviewLayerType`. Its layer type never changes after construction.
//! Service metadata is set once by the resolver and read-only afterwards.
//! Once resolved, only [`GeoviewLayerConfig::set_layer_filter`] and
//! [`GeoviewLayerConfig::set_layer_style`] mutate the tree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::EntryBody;
use geoview_core::EntryConfig;
use geoview_core::GeoviewLayerId;
use geoview_core::GeoviewLayerType;
use geoview_core::InitialSettings;
use geoview_core::LayerEntryError;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerPath;
use geoview_core::LayerTree;
use geoview_core::LeafConfig;
use serde_json::Map;
use serde_json::Value;

use crate::error::ConfigError;
use crate::group::BuildContext;
use crate::group::build_entries;
use crate::paths::normalize_metadata_access_path;
use crate::validator::SchemaValidator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resolved configuration of one geoview layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoviewLayerConfig {
    /// Unique id; first segment of every layer path.
    geoview_layer_id: GeoviewLayerId,
    /// Source format, fixed at construction.
    geoview_layer_type: GeoviewLayerType,
    /// Display name.
    pub geoview_layer_name: Option<String>,
    /// Trimmed service or file base path.
    metadata_access_path: Option<String>,
    /// Display settings cascaded to every entry.
    pub initial_settings: InitialSettings,
    /// True when the layer carries a time dimension.
    pub is_time_aware: bool,
    /// Date format shown to users.
    pub external_date_format: Option<String>,
    /// Service metadata fetched once per root.
    service_metadata: Option<Value>,
    /// Entry tree; roots are `listOfLayerEntryConfig`.
    tree: LayerTree,
    /// Root-level failure.
    error: Option<LayerEntryError>,
}

impl GeoviewLayerConfig {
    /// Builds a root and its entry tree from raw user JSON.
    ///
    /// Entry failures are recorded on the tree; only root-level problems are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the id or type is missing,
    /// [`ConfigError::UnsupportedLayerType`] for unknown or unexpanded
    /// `geoCore` types, and [`ConfigError::Parse`] for unreadable settings.
    pub fn from_raw(
        raw: &Value,
        validator: &SchemaValidator,
        max_tree_depth: usize,
    ) -> Result<Self, ConfigError> {
        let geoview_layer_id = parse_geoview_layer_id(raw)?;
        let geoview_layer_type = parse_geoview_layer_type(raw)?;
        if geoview_layer_type == GeoviewLayerType::GeoCore {
            return Err(ConfigError::UnsupportedLayerType(
                "geoCore layers must be expanded by a config reader".to_string(),
            ));
        }
        let metadata_access_path = raw
            .get("metadataAccessPath")
            .and_then(Value::as_str)
            .map(normalize_metadata_access_path)
            .filter(|path| !path.is_empty());
        let initial_settings = match raw.get("initialSettings") {
            Some(settings) => serde_json::from_value(settings.clone())
                .map_err(|err| ConfigError::Parse(format!("initialSettings: {err}")))?,
            None => InitialSettings::default(),
        };
        let mut tree = LayerTree::new(geoview_layer_id.clone());
        let entries = raw
            .get("listOfLayerEntryConfig")
            .and_then(Value::as_array)
            .ok_or_else(|| ConfigError::MissingField("listOfLayerEntryConfig".to_string()))?;
        let context = BuildContext {
            format: geoview_layer_type,
            metadata_access_path: metadata_access_path.as_deref(),
            root_settings: &initial_settings,
            validator,
            max_tree_depth,
        };
        build_entries(&mut tree, None, entries, &context)?;
        Ok(Self {
            geoview_layer_id,
            geoview_layer_type,
            geoview_layer_name: raw.get("geoviewLayerName").and_then(Value::as_str).map(str::to_string),
            metadata_access_path,
            initial_settings,
            is_time_aware: raw.get("isTimeAware").and_then(Value::as_bool).unwrap_or(false),
            external_date_format: raw
                .get("externalDateFormat")
                .and_then(Value::as_str)
                .map(str::to_string),
            service_metadata: None,
            tree,
            error: None,
        })
    }

    /// Builds an errored root with an empty tree.
    #[must_use]
    pub fn failed(
        geoview_layer_id: GeoviewLayerId,
        geoview_layer_type: GeoviewLayerType,
        kind: LayerEntryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let error = LayerEntryError::new(LayerPath::parse(geoview_layer_id.as_str()), kind, message);
        Self {
            tree: LayerTree::new(geoview_layer_id.clone()),
            geoview_layer_id,
            geoview_layer_type,
            geoview_layer_name: None,
            metadata_access_path: None,
            initial_settings: InitialSettings::default(),
            is_time_aware: false,
            external_date_format: None,
            service_metadata: None,
            error: Some(error),
        }
    }

    /// Returns the geoview layer id.
    #[must_use]
    pub const fn geoview_layer_id(&self) -> &GeoviewLayerId {
        &self.geoview_layer_id
    }

    /// Returns the immutable layer type.
    #[must_use]
    pub const fn geoview_layer_type(&self) -> GeoviewLayerType {
        self.geoview_layer_type
    }

    /// Returns the trimmed metadata access path.
    #[must_use]
    pub fn metadata_access_path(&self) -> Option<&str> {
        self.metadata_access_path.as_deref()
    }

    /// Returns the fetched service metadata.
    #[must_use]
    pub const fn service_metadata(&self) -> Option<&Value> {
        self.service_metadata.as_ref()
    }

    /// Stores the service metadata; later calls are ignored.
    pub(crate) fn set_service_metadata(&mut self, metadata: Value) {
        if self.service_metadata.is_none() {
            self.service_metadata = Some(metadata);
        }
    }

    /// Returns the entry tree.
    #[must_use]
    pub const fn tree(&self) -> &LayerTree {
        &self.tree
    }

    /// Returns the entry tree for resolution.
    pub(crate) const fn tree_mut(&mut self) -> &mut LayerTree {
        &mut self.tree
    }

    /// Returns the root-level failure.
    #[must_use]
    pub const fn error(&self) -> Option<&LayerEntryError> {
        self.error.as_ref()
    }

    /// Records a root-level failure; the first one is kept.
    pub(crate) fn mark_error(&mut self, kind: LayerEntryErrorKind, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(LayerEntryError::new(LayerPath::parse(self.geoview_layer_id.as_str()), kind, message));
        }
    }

    /// Returns every failure: the root error first, then nodes in pre-order.
    #[must_use]
    pub fn errors(&self) -> Vec<&LayerEntryError> {
        self.error
            .iter()
            .chain(self.tree.iter().filter_map(|(_, node)| node.error()))
            .collect()
    }

    /// Looks up an entry by layer path.
    #[must_use]
    pub fn layer_config(&self, layer_path: &LayerPath) -> Option<&EntryConfig> {
        self.tree.find_by_path(layer_path).and_then(|id| self.tree.get(id))
    }

    /// Sets the attribute filter of a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the path names no leaf.
    pub fn set_layer_filter(
        &mut self,
        layer_path: &LayerPath,
        filter: Option<String>,
    ) -> Result<(), ConfigError> {
        self.leaf_body_mut(layer_path).map(|leaf| leaf.layer_filter = filter)
    }

    /// Sets the style definition of a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the path names no leaf.
    pub fn set_layer_style(&mut self, layer_path: &LayerPath, style: Value) -> Result<(), ConfigError> {
        self.leaf_body_mut(layer_path).map(|leaf| leaf.style = Some(style))
    }

    /// Returns the mutable leaf body at `layer_path`.
    fn leaf_body_mut(
        &mut self,
        layer_path: &LayerPath,
    ) -> Result<&mut LeafConfig, ConfigError> {
        let id = self
            .tree
            .find_by_path(layer_path)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown layer path {layer_path}")))?;
        match self.tree.get_mut(id).map(|node| &mut node.body) {
            Some(EntryBody::Leaf(leaf)) => Ok(leaf),
            _ => Err(ConfigError::Invalid(format!("{layer_path} is not a leaf layer"))),
        }
    }

    /// Serializes the root and its nested entries.
    ///
    /// # Errors
    ///
    /// Returns an error when a node fails to serialize.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        map.insert("geoviewLayerId".to_string(), serde_json::to_value(&self.geoview_layer_id)?);
        map.insert("geoviewLayerType".to_string(), serde_json::to_value(self.geoview_layer_type)?);
        if let Some(name) = &self.geoview_layer_name {
            map.insert("geoviewLayerName".to_string(), Value::from(name.as_str()));
        }
        if let Some(path) = &self.metadata_access_path {
            map.insert("metadataAccessPath".to_string(), Value::from(path.as_str()));
        }
        if let Some(format) = &self.external_date_format {
            map.insert("externalDateFormat".to_string(), Value::from(format.as_str()));
        }
        map.insert("isTimeAware".to_string(), Value::from(self.is_time_aware));
        map.insert("initialSettings".to_string(), serde_json::to_value(&self.initial_settings)?);
        map.insert("listOfLayerEntryConfig".to_string(), self.tree.to_json()?);
        if let Some(error) = &self.error {
            map.insert("error".to_string(), serde_json::to_value(error)?);
        }
        Ok(Value::Object(map))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads `geoviewLayerId`; integers are accepted.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when the id is absent or empty.
pub fn parse_geoview_layer_id(raw: &Value) -> Result<GeoviewLayerId, ConfigError> {
    match raw.get("geoviewLayerId") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(GeoviewLayerId::new(id.trim())),
        Some(Value::Number(id)) => Ok(GeoviewLayerId::new(id.to_string())),
        _ => Err(ConfigError::MissingField("geoviewLayerId".to_string())),
    }
}

/// Reads `geoviewLayerType`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when absent and
/// [`ConfigError::UnsupportedLayerType`] for unknown labels.
pub fn parse_geoview_layer_type(raw: &Value) -> Result<GeoviewLayerType, ConfigError> {
    let label = raw
        .get("geoviewLayerType")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingField("geoviewLayerType".to_string()))?;
    GeoviewLayerType::from_label(label).ok_or_else(|| ConfigError::UnsupportedLayerType(label.to_string()))
}
