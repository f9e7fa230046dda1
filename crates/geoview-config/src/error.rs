// crates/geoview-config/src/error.rs
// ============================================================================
// Module: Config Errors
// Description: Error type for settings loading, schema compilation, and construction.
// Purpose: Provide stable, string-payload error variants for configuration failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ConfigError`] is the one thrown error category of the configuration
//! crate. Node-level resolution failures are never thrown; they are recorded on
//! the node as [`geoview_core::LayerEntryError`] instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A mandatory field is missing.
    #[error("missing field: {0}")]
    MissingField(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// A schema fragment failed to compile.
    #[error("schema compile error: {0}")]
    SchemaCompile(String),
    /// The geoview layer type is unknown or not allowed here.
    #[error("unsupported layer type: {0}")]
    UnsupportedLayerType(String),
}

impl ConfigError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::Invalid(_) => "invalid",
            Self::Parse(_) => "parse",
            Self::Io(_) => "io",
            Self::SchemaCompile(_) => "schema_compile",
            Self::UnsupportedLayerType(_) => "unsupported_layer_type",
        }
    }
}
