// crates/geoview-config/src/lib.rs
// ============================================================================
// Module: GeoView Config Library
// Description: Validation, construction, and resolution of layer configs.
// Purpose: Turn raw layer JSON into resolved geoview layer trees.
// Dependencies: crate::{resolver, geoview_layer, map_feature, validator}
// ============================================================================

//! ## Overview
//! GeoView config validates raw layer JSON against schema fragments, builds
//! entry trees, fetches service and per-leaf metadata through a
//! [`geoview_core::MetadataFetcher`], and layers defaults with the precedence
//! user config, then metadata, then hard defaults. Failures are recorded on
//! the node that failed; the rest of the tree keeps resolving.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod geoview_layer;
pub mod group;
pub mod leaf;
pub mod map_feature;
pub mod metadata;
pub mod paths;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ConfigError;
pub use geoview_layer::GeoviewLayerConfig;
pub use map_feature::BasemapOptions;
pub use map_feature::MapConfig;
pub use map_feature::MapFeatureConfig;
pub use map_feature::MapInteraction;
pub use map_feature::ServiceUrls;
pub use map_feature::ViewSettings;
pub use metadata::LeafMetadataOutcome;
pub use metadata::LeafMetadataPlan;
pub use metadata::SubLayer;
pub use paths::normalize_data_access_path;
pub use resolver::ErrorCallback;
pub use resolver::LayerConfigResolver;
pub use schema::schema_document;
pub use settings::GeocoreSettings;
pub use settings::HttpSettings;
pub use settings::ResolutionSettings;
pub use settings::ResolverSettings;
pub use validator::SchemaValidator;
