// crates/geoview-core/src/core/mod.rs
// ============================================================================
// Module: GeoView Core Types
// Description: Canonical layer configuration tree types.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types define identifiers, layer formats, entry nodes, the layer tree,
//! and the default layering merge. They carry no I/O and are the source of
//! truth for the resolved configuration handed to renderers.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod entry;
pub mod identifiers;
pub mod layer_types;
pub mod merge;
pub mod source;
pub mod tree;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entry::EntryBody;
pub use entry::EntryConfig;
pub use entry::GroupConfig;
pub use entry::LayerEntryError;
pub use entry::LayerEntryErrorKind;
pub use entry::LeafConfig;
pub use identifiers::GeoviewLayerId;
pub use identifiers::LAYER_PATH_SEPARATOR;
pub use identifiers::LayerId;
pub use identifiers::LayerPath;
pub use identifiers::NodeId;
pub use layer_types::DisplayLanguage;
pub use layer_types::EntryType;
pub use layer_types::GEOVIEW_LAYER_SCHEMA_PATH;
pub use layer_types::GROUP_SCHEMA_PATH;
pub use layer_types::GeoviewLayerType;
pub use layer_types::LayerStatus;
pub use layer_types::MAP_SCHEMA_PATH;
pub use merge::deep_merge;
pub use merge::merge_layers;
pub use source::FeatureInfo;
pub use source::InitialSettings;
pub use source::LayerStates;
pub use source::OutField;
pub use source::SourceConfig;
pub use source::TemporalDimension;
pub use tree::LayerTree;
pub use tree::TreeError;
