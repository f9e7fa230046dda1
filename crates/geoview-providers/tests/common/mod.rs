// crates/geoview-providers/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Local axum servers and fetch settings for provider tests.
// Purpose: Serve canned metadata and catalogue responses over loopback HTTP.
// Dependencies: axum, geoview-config, tokio
// ============================================================================

//! ## Overview
//! Helpers that bind an axum router on `127.0.0.1:0` and build fetch
//! settings that allow cleartext loopback requests.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Router;
use geoview_config::HttpSettings;
use geoview_providers::HttpMetadataFetcher;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Servers
// ============================================================================

/// Serves the router built by `build` and returns its base URL.
///
/// `build` receives the base URL so handlers can point back at the server.
pub async fn spawn_server(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let base = format!("http://{}", listener.local_addr().expect("listener address"));
    let router = build(base.clone());
    let _server = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    base
}

// ============================================================================
// SECTION: Fetchers
// ============================================================================

/// Settings allowing cleartext loopback requests with short timeouts.
pub fn local_settings() -> HttpSettings {
    HttpSettings {
        timeout_ms: 2_000,
        connect_timeout_ms: 1_000,
        allow_http: true,
        ..HttpSettings::default()
    }
}

/// Fetcher over [`local_settings`].
pub fn local_fetcher() -> HttpMetadataFetcher {
    HttpMetadataFetcher::from_settings(&local_settings()).expect("http client builds")
}
