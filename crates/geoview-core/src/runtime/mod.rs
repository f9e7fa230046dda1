// crates/geoview-core/src/runtime/mod.rs
// ============================================================================
// Module: GeoView Runtime Helpers
// Description: Cancellation, reference fetchers, and diagnostic sinks.
// Purpose: Provide ready-to-use implementations of the core interfaces.
// Dependencies: crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! Runtime helpers are small, dependency-light implementations used by the
//! resolver, by tests, and by embedders that do not need a network stack.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod abort;
pub mod diagnostics;
pub mod fetch;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use abort::AbortController;
pub use abort::AbortSignal;
pub use diagnostics::FileDiagnosticSink;
pub use diagnostics::MemoryDiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::StderrDiagnosticSink;
pub use fetch::InMemoryMetadataFetcher;
