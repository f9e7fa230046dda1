// crates/geoview-providers/src/uuid_reader.rs
// ============================================================================
// Module: GeoCore UUID Config Reader
// Description: Expands GeoCore catalogue UUIDs into raw geoview layer configs.
// Purpose: Reshape catalogue envelopes into the raw layer JSON shape.
// Dependencies: geoview-config, geoview-core, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! [`UuidConfigReader`] requests `<base>/vcs?lang=<lang>&id=<uuids>` through a
//! [`MetadataFetcher`] and reads the catalogue envelope. Layers come from
//! `response.rcs.<lang>[]` and charts from
//! `response.gcs[].<lang>.packages.geochart`. Each catalogue entry is
//! reshaped into raw geoview layer JSON for the resolver.
//!
//! Failures never fail the batch. A malformed entry is reported and skipped,
//! a UUID without an entry is reported as not found, and an unreadable
//! envelope reports every requested UUID. An aborted read returns nothing
//! and reports nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use geoview_config::ErrorCallback;
use geoview_config::GeocoreSettings;
use geoview_core::AbortSignal;
use geoview_core::ConfigDiagnostic;
use geoview_core::DiagnosticSink;
use geoview_core::DisplayLanguage;
use geoview_core::EVENT_READER_ENTRY_SKIPPED;
use geoview_core::FetchError;
use geoview_core::GeoviewLayerType;
use geoview_core::LayerConfigReader;
use geoview_core::LayerEntryError;
use geoview_core::LayerEntryErrorKind;
use geoview_core::LayerPath;
use geoview_core::MetadataFetcher;
use geoview_core::MetadataRequest;
use geoview_core::ReaderOutcome;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// GeoCore reader failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// The catalogue request URL could not be built.
    #[error("invalid geocore url: {0}")]
    InvalidUrl(String),
    /// The catalogue request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The catalogue envelope has an unexpected shape.
    #[error("malformed geocore envelope: {0}")]
    Envelope(String),
    /// One catalogue entry has an unexpected shape.
    #[error("malformed geocore entry: {0}")]
    Entry(String),
}

impl ReaderError {
    /// Returns the entry error kind reported for this failure.
    #[must_use]
    pub const fn kind(&self) -> LayerEntryErrorKind {
        match self {
            Self::Fetch(FetchError::Cancelled) => LayerEntryErrorKind::Cancelled,
            Self::InvalidUrl(_) | Self::Fetch(_) => LayerEntryErrorKind::MetadataFetch,
            Self::Envelope(_) | Self::Entry(_) => LayerEntryErrorKind::MalformedEntry,
        }
    }
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// Layers and charts read for a batch of UUIDs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UuidReaderResponse {
    /// Raw geoview layer JSON objects, in catalogue order.
    pub layers: Vec<Value>,
    /// Chart package configurations.
    pub geocharts: Vec<Value>,
    /// True when the read was aborted.
    pub cancelled: bool,
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Config reader backed by the GeoCore `vcs` endpoint.
#[derive(Clone)]
pub struct UuidConfigReader {
    /// Fetcher used for catalogue requests.
    fetcher: Arc<dyn MetadataFetcher>,
    /// GeoCore endpoint settings.
    settings: GeocoreSettings,
    /// Diagnostics sink.
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for UuidConfigReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UuidConfigReader").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl UuidConfigReader {
    /// Creates a reader over `fetcher`.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        settings: GeocoreSettings,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            fetcher,
            settings,
            sink,
        }
    }

    /// Returns the GeoCore settings.
    #[must_use]
    pub const fn settings(&self) -> &GeocoreSettings {
        &self.settings
    }

    /// Reads the layer configs and charts registered for `uuids`.
    ///
    /// Every failure goes through `on_error`; an aborted read reports nothing.
    pub async fn get_gv_config_from_uuids(
        &self,
        base_url: &str,
        lang: DisplayLanguage,
        uuids: &[String],
        signal: &AbortSignal,
        on_error: ErrorCallback<'_>,
    ) -> UuidReaderResponse {
        if uuids.is_empty() {
            return UuidReaderResponse::default();
        }
        let envelope = match self.fetch_envelope(base_url, lang, uuids, signal).await {
            Ok(envelope) => envelope,
            Err(ReaderError::Fetch(FetchError::Cancelled)) => return cancelled(),
            Err(err) => {
                report_all(uuids, &err, on_error);
                return UuidReaderResponse::default();
            }
        };
        if signal.is_aborted() {
            return cancelled();
        }
        let entries = match layer_entries(&envelope, lang) {
            Ok(entries) => entries,
            Err(err) => {
                report_all(uuids, &err, on_error);
                return UuidReaderResponse::default();
            }
        };
        let mut layers = Vec::with_capacity(entries.len());
        let mut seen = BTreeSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let entry_id = entry.get("id").and_then(Value::as_str);
            if let Some(id) = entry_id {
                seen.insert(id.to_string());
            }
            match reshape_entry(entry) {
                Ok(layer) => layers.push(layer),
                Err(err) => {
                    let path = entry_id.map_or_else(|| format!("rcs/{index}"), str::to_string);
                    self.sink.record(
                        &ConfigDiagnostic::new(EVENT_READER_ENTRY_SKIPPED, err.to_string())
                            .with_layer_path(path.clone())
                            .with_candidate(entry.clone()),
                    );
                    on_error(&LayerEntryError::new(LayerPath::parse(path), err.kind(), err.to_string()));
                }
            }
        }
        for uuid in uuids.iter().filter(|uuid| !seen.contains(uuid.as_str())) {
            on_error(&LayerEntryError::new(
                LayerPath::parse(uuid.clone()),
                LayerEntryErrorKind::LayerNotFound,
                "geocore returned no layer for this uuid",
            ));
        }
        UuidReaderResponse {
            layers,
            geocharts: geocharts(&envelope, lang),
            cancelled: false,
        }
    }

    /// Fetches the catalogue envelope for `uuids`.
    async fn fetch_envelope(
        &self,
        base_url: &str,
        lang: DisplayLanguage,
        uuids: &[String],
        signal: &AbortSignal,
    ) -> Result<Value, ReaderError> {
        let url = vcs_url(base_url, lang, uuids)?;
        let body = self.fetcher.fetch(&MetadataRequest::json(url), signal).await?;
        body.into_json().ok_or_else(|| ReaderError::Envelope("response is not json".to_string()))
    }
}

#[async_trait]
impl LayerConfigReader for UuidConfigReader {
    async fn read_layer_configs(
        &self,
        ids: &[String],
        language: DisplayLanguage,
        signal: &AbortSignal,
    ) -> ReaderOutcome {
        let mut errors = Vec::new();
        let mut on_error = |error: &LayerEntryError| errors.push(error.clone());
        let response = self
            .get_gv_config_from_uuids(&self.settings.base_url, language, ids, signal, &mut on_error)
            .await;
        ReaderOutcome {
            layers: response.layers,
            geocharts: response.geocharts,
            errors,
            cancelled: response.cancelled,
        }
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Builds the `vcs` request URL.
fn vcs_url(base_url: &str, lang: DisplayLanguage, uuids: &[String]) -> Result<String, ReaderError> {
    let mut url = Url::parse(&format!("{}/vcs", base_url.trim_end_matches('/')))
        .map_err(|err| ReaderError::InvalidUrl(format!("{base_url}: {err}")))?;
    url.query_pairs_mut().append_pair("lang", lang.as_str()).append_pair("id", &uuids.join(","));
    Ok(url.into())
}

/// Returns `response.rcs.<lang>[]`.
fn layer_entries(envelope: &Value, lang: DisplayLanguage) -> Result<&[Value], ReaderError> {
    envelope
        .pointer(&format!("/response/rcs/{}", lang.as_str()))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| ReaderError::Envelope(format!("missing response.rcs.{lang}")))
}

/// Returns every `response.gcs[].<lang>.packages.geochart` object.
fn geocharts(envelope: &Value, lang: DisplayLanguage) -> Vec<Value> {
    let pointer = format!("/{}/packages/geochart", lang.as_str());
    envelope
        .pointer("/response/gcs")
        .and_then(Value::as_array)
        .map(|charts| charts.iter().filter_map(|chart| chart.pointer(&pointer)).cloned().collect())
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Reshaping
// ============================================================================

/// Reshapes one `rcs` entry into raw geoview layer JSON.
fn reshape_entry(entry: &Value) -> Result<Value, ReaderError> {
    let object = entry.as_object().ok_or_else(|| ReaderError::Entry("entry is not an object".to_string()))?;
    let id = required_str(object, "id")?;
    let label = required_str(object, "layerType")?;
    let layer_type = GeoviewLayerType::from_label(label)
        .filter(|kind| *kind != GeoviewLayerType::GeoCore)
        .ok_or_else(|| ReaderError::Entry(format!("{id}: unsupported layerType {label}")))?;
    let url = object.get("url").and_then(Value::as_str);
    let server_type = object.get("serverType").and_then(Value::as_str);
    let layer_entries = object
        .get("layerEntries")
        .and_then(Value::as_array)
        .ok_or_else(|| ReaderError::Entry(format!("{id}: layerEntries must be an array")))?;
    let list = layer_entries
        .iter()
        .map(|layer_entry| reshape_layer_entry(layer_type, layer_entry, url, server_type))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ReaderError::Entry(format!("{id}: {err}")))?;

    let mut root = Map::new();
    root.insert("geoviewLayerId".to_string(), Value::from(id));
    root.insert("geoviewLayerType".to_string(), Value::from(layer_type.as_str()));
    if let Some(name) = object.get("name").and_then(Value::as_str) {
        root.insert("geoviewLayerName".to_string(), Value::from(name));
    }
    if let Some(url) = url {
        root.insert("metadataAccessPath".to_string(), Value::from(url));
    }
    if let Some(time_aware) = object.get("isTimeAware").and_then(Value::as_bool) {
        root.insert("isTimeAware".to_string(), Value::Bool(time_aware));
    }
    root.insert("listOfLayerEntryConfig".to_string(), Value::Array(list));
    Ok(Value::Object(root))
}

/// Reshapes one entry of `layerEntries` into a raw leaf.
fn reshape_layer_entry(
    layer_type: GeoviewLayerType,
    layer_entry: &Value,
    url: Option<&str>,
    server_type: Option<&str>,
) -> Result<Value, String> {
    let object = layer_entry.as_object().ok_or_else(|| "layer entry is not an object".to_string())?;
    let key = if layer_type.is_esri() { "index" } else { "id" };
    let layer_id = match object.get(key) {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(index)) => index.to_string(),
        _ => return Err(format!("layer entry has no usable {key}")),
    };
    let mut leaf = Map::new();
    leaf.insert("layerId".to_string(), Value::from(layer_id));
    if let Some(name) = object.get("name").and_then(Value::as_str) {
        leaf.insert("layerName".to_string(), Value::from(name));
    }
    let mut source = Map::new();
    if is_file_format(layer_type)
        && let Some(path) = object.get("url").and_then(Value::as_str).or(url)
    {
        source.insert("dataAccessPath".to_string(), Value::from(path));
    }
    if layer_type == GeoviewLayerType::OgcWms
        && let Some(server_type) = server_type
    {
        source.insert("serverType".to_string(), Value::from(server_type));
    }
    if !source.is_empty() {
        leaf.insert("source".to_string(), Value::Object(source));
    }
    Ok(Value::Object(leaf))
}

/// Returns true for formats whose leaves point at a file.
const fn is_file_format(layer_type: GeoviewLayerType) -> bool {
    matches!(
        layer_type,
        GeoviewLayerType::GeoJson
            | GeoviewLayerType::GeoPackage
            | GeoviewLayerType::Csv
            | GeoviewLayerType::Kml
            | GeoviewLayerType::Wkb
            | GeoviewLayerType::GeoTiff
            | GeoviewLayerType::Shapefile
            | GeoviewLayerType::ImageStatic
    )
}

/// Reads a required non-empty string field.
fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, ReaderError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ReaderError::Entry(format!("missing {key}")))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Response for an aborted read.
fn cancelled() -> UuidReaderResponse {
    UuidReaderResponse {
        cancelled: true,
        ..UuidReaderResponse::default()
    }
}

/// Reports `err` once per requested UUID.
fn report_all(uuids: &[String], err: &ReaderError, on_error: ErrorCallback<'_>) {
    for uuid in uuids {
        on_error(&LayerEntryError::new(LayerPath::parse(uuid.clone()), err.kind(), err.to_string()));
    }
}
