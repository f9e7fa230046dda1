// crates/geoview-config/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared resolver fixtures for geoview-config integration tests.
// Purpose: Build resolvers over canned metadata and collect reported errors.
// Dependencies: geoview-config, geoview-core
// ============================================================================

//! ## Overview
//! Helpers that wire a [`LayerConfigResolver`] to an in-memory fetcher and a
//! memory diagnostic sink, and resolve raw roots while collecting callbacks.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use geoview_config::GeoviewLayerConfig;
use geoview_config::LayerConfigResolver;
use geoview_config::ResolverSettings;
use geoview_core::AbortSignal;
use geoview_core::InMemoryMetadataFetcher;
use geoview_core::LayerEntryError;
use geoview_core::LayerPath;
use geoview_core::LeafConfig;
use geoview_core::MemoryDiagnosticSink;
use serde_json::Value;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Resolver plus the sink receiving its diagnostics.
pub struct Harness {
    /// Resolver under test.
    pub resolver: LayerConfigResolver,
    /// Collected diagnostics.
    pub sink: Arc<MemoryDiagnosticSink>,
}

/// Builds a harness with default settings.
pub fn harness(fetcher: InMemoryMetadataFetcher) -> Harness {
    harness_with(fetcher, ResolverSettings::default())
}

/// Builds a harness with explicit settings.
pub fn harness_with(fetcher: InMemoryMetadataFetcher, settings: ResolverSettings) -> Harness {
    let sink = Arc::new(MemoryDiagnosticSink::new());
    let resolver = LayerConfigResolver::new(Arc::new(fetcher), settings, Arc::clone(&sink) as _)
        .expect("resolver settings are valid");
    Harness {
        resolver,
        sink,
    }
}

/// Resolves raw roots and returns the configs with every reported error.
pub async fn resolve(
    harness: &Harness,
    raw: &[Value],
    signal: &AbortSignal,
) -> (Vec<GeoviewLayerConfig>, Vec<LayerEntryError>) {
    let mut reported = Vec::new();
    let mut on_error = |error: &LayerEntryError| reported.push(error.clone());
    let configs = harness.resolver.prevalidate_geoview_layers_config(raw, signal, &mut on_error).await;
    (configs, reported)
}

/// Returns the leaf body at `path`.
pub fn leaf<'a>(config: &'a GeoviewLayerConfig, path: &str) -> &'a LeafConfig {
    config
        .layer_config(&LayerPath::parse(path))
        .and_then(|node| node.as_leaf())
        .unwrap_or_else(|| panic!("no leaf at {path}"))
}
