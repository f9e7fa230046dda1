// crates/geoview-core/src/core/identifiers.rs
// ============================================================================
// Module: GeoView Identifiers
// Description: Opaque identifiers for geoview layers, layer entries, and paths.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout the layer configuration
//! tree. Geoview layer and layer entry identifiers are opaque strings. Layer
//! paths are derived from the ancestor chain and can only be built through
//! [`LayerPath::root`] and [`LayerPath::child`], so a user can never assign one
//! directly. [`NodeId`] is a non-owning arena index into a [`crate::LayerTree`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator used between layer path segments.
pub const LAYER_PATH_SEPARATOR: char = '/';

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier of one geoview layer (one addition of a service to the map).
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoviewLayerId(String);

impl GeoviewLayerId {
    /// Creates a new geoview layer identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeoviewLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for GeoviewLayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of one layer entry, unique among its siblings.
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is scoped to the parent node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// Creates a new layer entry identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Slash-joined chain of identifiers locating a node inside a map.
///
/// The first segment is the owning [`GeoviewLayerId`]; every following segment
/// is a [`LayerId`] on the way down to the node.
///
/// # Invariants
/// - Derived only; there is no public constructor from an arbitrary string
///   other than [`LayerPath::parse`], which is used for lookups.
/// - A child path always starts with `<parent>/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerPath(String);

impl LayerPath {
    /// Returns the path of a root entry owned by the given geoview layer.
    #[must_use]
    pub fn root(geoview_layer_id: &GeoviewLayerId, layer_id: &LayerId) -> Self {
        Self(format!("{geoview_layer_id}{LAYER_PATH_SEPARATOR}{layer_id}"))
    }

    /// Returns the path of a child entry below this path.
    #[must_use]
    pub fn child(&self, layer_id: &LayerId) -> Self {
        Self(format!("{}{LAYER_PATH_SEPARATOR}{layer_id}", self.0))
    }

    /// Wraps an existing path string for lookups.
    #[must_use]
    pub fn parse(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns true when `self` is a strict descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        self.0
            .strip_prefix(ancestor.as_str())
            .is_some_and(|rest| rest.starts_with(LAYER_PATH_SEPARATOR))
    }

    /// Returns the owning geoview layer identifier segment.
    #[must_use]
    pub fn geoview_layer_segment(&self) -> &str {
        self.0.split(LAYER_PATH_SEPARATOR).next().unwrap_or_default()
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Arena index of a node inside a [`crate::LayerTree`].
///
/// Used for parent and child links so nodes never hold references to each
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a node identifier from an arena index.
    #[must_use]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
