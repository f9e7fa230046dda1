// crates/geoview-core/src/interfaces/mod.rs
// ============================================================================
// Module: GeoView Interfaces
// Description: Backend-agnostic seams for metadata fetches, readers, and diagnostics.
// Purpose: Define the contracts the resolution pipeline depends on.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces decouple the resolution pipeline from transports and logging.
//! [`MetadataFetcher`] retrieves service metadata, [`LayerConfigReader`] turns
//! catalogue ids into raw geoview layer JSON, and [`DiagnosticSink`] receives
//! structured diagnostics. Every fetch takes an [`AbortSignal`] and must end
//! with [`FetchError::Cancelled`] once the signal fires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::entry::LayerEntryError;
use crate::core::layer_types::DisplayLanguage;
use crate::runtime::abort::AbortSignal;

// ============================================================================
// SECTION: Metadata Fetch
// ============================================================================

/// Expected body kind of a metadata response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFormat {
    /// JSON document.
    Json,
    /// Text document, typically XML capabilities.
    Text,
}

/// One metadata request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetadataRequest {
    /// Absolute request URL.
    pub url: String,
    /// Expected body kind.
    pub format: MetadataFormat,
}

impl MetadataRequest {
    /// Creates a JSON metadata request.
    #[must_use]
    pub fn json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: MetadataFormat::Json,
        }
    }

    /// Creates a text metadata request.
    #[must_use]
    pub fn text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: MetadataFormat::Text,
        }
    }
}

/// Metadata response body.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataBody {
    /// Parsed JSON document.
    Json(Value),
    /// Raw text document.
    Text(String),
}

impl MetadataBody {
    /// Returns the JSON document, if any.
    #[must_use]
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the text document, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

/// Metadata fetch errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The abort signal fired before the fetch completed.
    #[error("metadata fetch cancelled")]
    Cancelled,
    /// The URL could not be parsed.
    #[error("invalid metadata url: {0}")]
    InvalidUrl(String),
    /// The URL was rejected by the fetch policy.
    #[error("metadata url rejected: {0}")]
    Policy(String),
    /// The request failed at the transport layer.
    #[error("metadata transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("metadata request to {url} failed with status {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response exceeded the configured size limit.
    #[error("metadata response exceeds {limit} bytes")]
    TooLarge {
        /// Size limit in bytes.
        limit: usize,
    },
    /// The body could not be parsed.
    #[error("metadata parse error: {0}")]
    Parse(String),
    /// The service answered with an application-level error.
    #[error("metadata provider error: {0}")]
    Provider(String),
}

impl FetchError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Policy(_) => "policy",
            Self::Transport(_) => "transport",
            Self::Status {
                ..
            } => "status",
            Self::TooLarge {
                ..
            } => "too_large",
            Self::Parse(_) => "parse",
            Self::Provider(_) => "provider",
        }
    }
}

/// Retrieves service and layer metadata.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches one metadata document.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the document cannot be retrieved, and
    /// [`FetchError::Cancelled`] once `signal` is aborted.
    async fn fetch(
        &self,
        request: &MetadataRequest,
        signal: &AbortSignal,
    ) -> Result<MetadataBody, FetchError>;
}

// ============================================================================
// SECTION: Config Readers
// ============================================================================

/// Result of expanding catalogue ids into raw geoview layer configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderOutcome {
    /// Raw geoview layer JSON objects, in catalogue order.
    pub layers: Vec<Value>,
    /// Chart package configurations attached to the requested ids.
    pub geocharts: Vec<Value>,
    /// Per-id failures; empty when cancelled.
    pub errors: Vec<LayerEntryError>,
    /// True when the read was aborted.
    pub cancelled: bool,
}

/// Expands catalogue ids (GeoCore UUIDs) into raw geoview layer configs.
#[async_trait]
pub trait LayerConfigReader: Send + Sync {
    /// Reads the layer configs registered for `ids`.
    ///
    /// Failures are reported per id in [`ReaderOutcome::errors`]; a reader
    /// never fails the whole batch.
    async fn read_layer_configs(
        &self,
        ids: &[String],
        language: DisplayLanguage,
        signal: &AbortSignal,
    ) -> ReaderOutcome;
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Diagnostic event name for schema validation failures.
pub const EVENT_SCHEMA_VALIDATION_FAILED: &str = "schema_validation_failed";
/// Diagnostic event name for metadata fetch failures.
pub const EVENT_METADATA_FETCH_FAILED: &str = "metadata_fetch_failed";
/// Diagnostic event name for node-level failures.
pub const EVENT_LAYER_ENTRY_ERROR: &str = "layer_entry_error";
/// Diagnostic event name for aborted work.
pub const EVENT_RESOLUTION_CANCELLED: &str = "resolution_cancelled";
/// Diagnostic event name for skipped reader entries.
pub const EVENT_READER_ENTRY_SKIPPED: &str = "reader_entry_skipped";

/// Structured diagnostic emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigDiagnostic {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Schema path involved, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
    /// Layer path involved, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_path: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Offending JSON, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Value>,
}

impl ConfigDiagnostic {
    /// Creates a diagnostic stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, message: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            schema_path: None,
            layer_path: None,
            message: message.into(),
            candidate: None,
        }
    }

    /// Attaches a schema path.
    #[must_use]
    pub fn with_schema_path(mut self, schema_path: impl Into<String>) -> Self {
        self.schema_path = Some(schema_path.into());
        self
    }

    /// Attaches a layer path.
    #[must_use]
    pub fn with_layer_path(mut self, layer_path: impl Into<String>) -> Self {
        self.layer_path = Some(layer_path.into());
        self
    }

    /// Attaches the offending JSON.
    #[must_use]
    pub fn with_candidate(mut self, candidate: Value) -> Self {
        self.candidate = Some(candidate);
        self
    }
}

/// Sink for pipeline diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Records a diagnostic event.
    fn record(&self, event: &ConfigDiagnostic);
}
