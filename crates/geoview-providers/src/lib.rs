// crates/geoview-providers/src/lib.rs
// ============================================================================
// Module: GeoView Providers
// Description: Network-backed metadata fetcher and GeoCore config reader.
// Purpose: Plug real transports into the layer configuration pipeline.
// Dependencies: geoview-core, geoview-config, reqwest, url
// ============================================================================

//! ## Overview
//! This crate ships the HTTP implementation of
//! [`geoview_core::MetadataFetcher`] and the GeoCore implementation of
//! [`geoview_core::LayerConfigReader`].
//! Invariants:
//! - Every request observes the caller's abort signal.
//! - Response sizes are bounded and redirects are never followed.
//!
//! Security posture: metadata and catalogue responses are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod uuid_reader;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::HttpMetadataFetcher;
pub use uuid_reader::ReaderError;
pub use uuid_reader::UuidConfigReader;
pub use uuid_reader::UuidReaderResponse;
