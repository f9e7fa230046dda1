// crates/geoview-core/src/runtime/fetch.rs
// ============================================================================
// Module: In-Memory Metadata Fetcher
// Description: Deterministic metadata fetcher backed by a URL map.
// Purpose: Drive the resolution pipeline without network access.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! [`InMemoryMetadataFetcher`] answers requests from a fixed map of URLs to
//! bodies or errors and records every requested URL. Unknown URLs answer with a
//! 404 status error. URLs registered with [`InMemoryMetadataFetcher::with_hang`]
//! never complete until the abort signal fires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::interfaces::FetchError;
use crate::interfaces::MetadataBody;
use crate::interfaces::MetadataFetcher;
use crate::interfaces::MetadataRequest;
use crate::runtime::abort::AbortSignal;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Canned answer for one URL.
#[derive(Debug, Clone)]
enum CannedResponse {
    /// Successful body.
    Body(MetadataBody),
    /// Failure.
    Error(FetchError),
    /// Never completes unless aborted.
    Hang,
}

/// Metadata fetcher answering from an in-memory URL map.
#[derive(Debug, Default)]
pub struct InMemoryMetadataFetcher {
    /// Canned responses by exact URL.
    responses: BTreeMap<String, CannedResponse>,
    /// Requested URLs in call order.
    requests: Mutex<Vec<String>>,
}

impl InMemoryMetadataFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a JSON body for a URL.
    #[must_use]
    pub fn with_json(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), CannedResponse::Body(MetadataBody::Json(body)));
        self
    }

    /// Registers a text body for a URL.
    #[must_use]
    pub fn with_text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), CannedResponse::Body(MetadataBody::Text(body.into())));
        self
    }

    /// Registers an error for a URL.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), CannedResponse::Error(error));
        self
    }

    /// Registers a URL whose request only ends on abort.
    #[must_use]
    pub fn with_hang(mut self, url: impl Into<String>) -> Self {
        self.responses.insert(url.into(), CannedResponse::Hang);
        self
    }

    /// Returns the URLs requested so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MetadataFetcher for InMemoryMetadataFetcher {
    async fn fetch(
        &self,
        request: &MetadataRequest,
        signal: &AbortSignal,
    ) -> Result<MetadataBody, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.url.clone());
        }
        if signal.is_aborted() {
            return Err(FetchError::Cancelled);
        }
        match self.responses.get(&request.url) {
            Some(CannedResponse::Body(body)) => Ok(body.clone()),
            Some(CannedResponse::Error(error)) => Err(error.clone()),
            Some(CannedResponse::Hang) => {
                signal.aborted().await;
                Err(FetchError::Cancelled)
            }
            None => Err(FetchError::Status {
                url: request.url.clone(),
                status: 404,
            }),
        }
    }
}
