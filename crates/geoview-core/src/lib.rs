// crates/geoview-core/src/lib.rs
// ============================================================================
// Module: GeoView Core Library
// Description: Public API surface for the layer configuration core.
// Purpose: Expose tree types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! GeoView core defines the strongly typed layer configuration tree produced
//! by the resolution pipeline, the pure default layering merge, and the
//! interfaces through which metadata, catalogue readers, and diagnostics are
//! plugged in. It performs no I/O of its own.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ConfigDiagnostic;
pub use interfaces::DiagnosticSink;
pub use interfaces::EVENT_LAYER_ENTRY_ERROR;
pub use interfaces::EVENT_METADATA_FETCH_FAILED;
pub use interfaces::EVENT_READER_ENTRY_SKIPPED;
pub use interfaces::EVENT_RESOLUTION_CANCELLED;
pub use interfaces::EVENT_SCHEMA_VALIDATION_FAILED;
pub use interfaces::FetchError;
pub use interfaces::LayerConfigReader;
pub use interfaces::MetadataBody;
pub use interfaces::MetadataFetcher;
pub use interfaces::MetadataFormat;
pub use interfaces::MetadataRequest;
pub use interfaces::ReaderOutcome;
pub use runtime::AbortController;
pub use runtime::AbortSignal;
pub use runtime::FileDiagnosticSink;
pub use runtime::InMemoryMetadataFetcher;
pub use runtime::MemoryDiagnosticSink;
pub use runtime::NoopDiagnosticSink;
pub use runtime::StderrDiagnosticSink;
