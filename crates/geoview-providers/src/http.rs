// crates/geoview-providers/src/http.rs
// ============================================================================
// Module: HTTP Metadata Fetcher
// Description: Metadata fetcher backed by an async reqwest client.
// Purpose: Retrieve service and layer metadata with strict limits.
// Dependencies: geoview-config, geoview-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! [`HttpMetadataFetcher`] issues bounded GET requests for metadata
//! documents. It enforces scheme restrictions, connect and request timeouts,
//! disabled redirects, and a response size limit read chunk by chunk. Every
//! request races the caller's [`AbortSignal`].
//! Security posture: metadata servers are untrusted; oversized, redirected,
//! or malformed responses fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use geoview_config::HttpSettings;
use geoview_core::AbortSignal;
use geoview_core::FetchError;
use geoview_core::MetadataBody;
use geoview_core::MetadataFetcher;
use geoview_core::MetadataFormat;
use geoview_core::MetadataRequest;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use url::Url;

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Metadata fetcher for HTTP(S) services.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` URLs.
/// - Bodies larger than `max_response_bytes` are rejected.
/// - Redirects are not followed.
#[derive(Debug, Clone)]
pub struct HttpMetadataFetcher {
    /// Fetch policy and limits.
    settings: HttpSettings,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl HttpMetadataFetcher {
    /// Creates a fetcher from HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the HTTP client cannot be built.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .user_agent(settings.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| FetchError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            settings: settings.clone(),
            client,
        })
    }

    /// Sends the request and decodes the body.
    async fn fetch_unguarded(&self, request: &MetadataRequest) -> Result<MetadataBody, FetchError> {
        let url = validate_url(&request.url, self.settings.allow_http)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept_header(request.format))
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = read_response_limited(response, self.settings.max_response_bytes).await?;
        decode_body(bytes, request.format)
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(
        &self,
        request: &MetadataRequest,
        signal: &AbortSignal,
    ) -> Result<MetadataBody, FetchError> {
        signal.run(self.fetch_unguarded(request)).await.unwrap_or(Err(FetchError::Cancelled))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a URL and checks its scheme and credentials.
fn validate_url(raw: &str, allow_http: bool) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => return Err(FetchError::Policy("cleartext http is not allowed".to_string())),
        scheme => return Err(FetchError::Policy(format!("unsupported url scheme {scheme}"))),
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(FetchError::Policy("url credentials are not allowed".to_string()));
    }
    Ok(url)
}

/// Returns the `Accept` header for a body kind.
const fn accept_header(format: MetadataFormat) -> &'static str {
    match format {
        MetadataFormat::Json => "application/json",
        MetadataFormat::Text => "application/xml, text/xml, text/plain",
    }
}

/// Reads the response body chunk by chunk while enforcing a byte limit.
async fn read_response_limited(mut response: Response, max_bytes: usize) -> Result<Vec<u8>, FetchError> {
    let max_bytes_u64 = u64::try_from(max_bytes).map_err(|_| FetchError::TooLarge {
        limit: max_bytes,
    })?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(FetchError::TooLarge {
            limit: max_bytes,
        });
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| FetchError::Transport(err.to_string()))? {
        if body.len().saturating_add(chunk.len()) > max_bytes {
            return Err(FetchError::TooLarge {
                limit: max_bytes,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Decodes a body into the requested kind.
fn decode_body(bytes: Vec<u8>, format: MetadataFormat) -> Result<MetadataBody, FetchError> {
    match format {
        MetadataFormat::Json => serde_json::from_slice(&bytes)
            .map(MetadataBody::Json)
            .map_err(|err| FetchError::Parse(err.to_string())),
        MetadataFormat::Text => String::from_utf8(bytes)
            .map(MetadataBody::Text)
            .map_err(|_| FetchError::Parse("metadata body is not utf-8".to_string())),
    }
}
