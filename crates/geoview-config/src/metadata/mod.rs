// crates/geoview-config/src/metadata/mod.rs
// ============================================================================
// Module: Layer Metadata
// Description: Per-format metadata requests, parsing, and interpretation.
// Purpose: Turn service and layer metadata into default-layering overlays.
// Dependencies: geoview-core, roxmltree, serde_json
// ============================================================================

//! ## Overview
//! Metadata handling is split into pure steps so the resolver owns all I/O:
//! [`service_metadata_request`] names the one per-root document,
//! [`leaf_metadata_plan`] decides what a leaf needs, the `parse_*` functions
//! turn response bodies into JSON, and [`interpret_leaf_metadata`] turns the
//! fetched documents into an overlay, a metadata group, or a not-found
//! verdict. Dispatch is a closed `match` over [`GeoviewLayerType`].

// ============================================================================
// SECTION: Modules
// ============================================================================

mod esri;
mod file;
mod ogc_api;
mod wfs;
mod wms;

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::FetchError;
use geoview_core::GeoviewLayerType;
use geoview_core::LayerId;
use geoview_core::MetadataBody;
use geoview_core::MetadataRequest;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// What a leaf needs before it can be layered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafMetadataPlan {
    /// Fetch a per-leaf document.
    Fetch(MetadataRequest),
    /// Use the root's service metadata only.
    FromService,
    /// No metadata applies to this leaf.
    None,
    /// The service metadata does not list this leaf.
    NotFound(String),
}

/// Service-side child discovered while interpreting metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubLayer {
    /// Child layer id.
    pub layer_id: LayerId,
    /// Child display name, when the service provides one.
    pub layer_name: Option<String>,
}

/// Interpretation of a leaf's metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafMetadataOutcome {
    /// Default-layering overlay for the leaf.
    Overlay(Value),
    /// The leaf is a service-side group with these children.
    Group(Vec<SubLayer>),
    /// The metadata does not describe this leaf.
    NotFound(String),
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Returns the service metadata request for a root, when its format has one.
#[must_use]
pub fn service_metadata_request(
    format: GeoviewLayerType,
    metadata_access_path: Option<&str>,
) -> Option<MetadataRequest> {
    let path = metadata_access_path.map(str::trim).filter(|path| !path.is_empty())?;
    match format {
        GeoviewLayerType::EsriDynamic | GeoviewLayerType::EsriFeature | GeoviewLayerType::EsriImage => {
            Some(esri::service_request(path))
        }
        GeoviewLayerType::OgcWms => Some(wms::service_request(path)),
        GeoviewLayerType::OgcWfs => Some(wfs::service_request(path)),
        GeoviewLayerType::OgcFeature => Some(ogc_api::service_request(path)),
        GeoviewLayerType::Csv
        | GeoviewLayerType::GeoJson
        | GeoviewLayerType::Kml
        | GeoviewLayerType::Wkb
        | GeoviewLayerType::GeoPackage
        | GeoviewLayerType::Shapefile
        | GeoviewLayerType::GeoTiff => file::service_request(path),
        GeoviewLayerType::ImageStatic
        | GeoviewLayerType::XyzTiles
        | GeoviewLayerType::VectorTiles
        | GeoviewLayerType::GeoCore => None,
    }
}

/// Parses a service metadata body.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] for unreadable bodies and
/// [`FetchError::Provider`] when the service answered with an error document.
pub fn parse_service_metadata(format: GeoviewLayerType, body: MetadataBody) -> Result<Value, FetchError> {
    match format {
        GeoviewLayerType::OgcWms => wms::parse_capabilities(&text_body(body)?),
        GeoviewLayerType::OgcWfs => wfs::parse_capabilities(&text_body(body)?),
        GeoviewLayerType::EsriDynamic | GeoviewLayerType::EsriFeature | GeoviewLayerType::EsriImage => {
            esri::check_payload(json_body(body)?)
        }
        _ => json_body(body),
    }
}

/// Decides what metadata a leaf needs.
///
/// `base` is the root's metadata access path, or the leaf's own data access
/// path when the root has none.
#[must_use]
pub fn leaf_metadata_plan(
    format: GeoviewLayerType,
    layer_id: &LayerId,
    base: Option<&str>,
    service_metadata: Option<&Value>,
) -> LeafMetadataPlan {
    let base = base.map(str::trim).filter(|path| !path.is_empty());
    match format {
        GeoviewLayerType::EsriDynamic | GeoviewLayerType::EsriFeature => {
            esri::leaf_plan(format, layer_id, base, service_metadata)
        }
        GeoviewLayerType::EsriImage => {
            if service_metadata.is_some() { LeafMetadataPlan::FromService } else { LeafMetadataPlan::None }
        }
        GeoviewLayerType::OgcWms => wms::leaf_plan(layer_id, service_metadata),
        GeoviewLayerType::OgcWfs => wfs::leaf_plan(layer_id, base, service_metadata),
        GeoviewLayerType::OgcFeature => ogc_api::leaf_plan(layer_id, base, service_metadata),
        GeoviewLayerType::Csv
        | GeoviewLayerType::GeoJson
        | GeoviewLayerType::Kml
        | GeoviewLayerType::Wkb
        | GeoviewLayerType::GeoPackage
        | GeoviewLayerType::Shapefile
        | GeoviewLayerType::GeoTiff => {
            if service_metadata.is_some() { LeafMetadataPlan::FromService } else { LeafMetadataPlan::None }
        }
        GeoviewLayerType::ImageStatic
        | GeoviewLayerType::XyzTiles
        | GeoviewLayerType::VectorTiles
        | GeoviewLayerType::GeoCore => LeafMetadataPlan::None,
    }
}

/// Parses a per-leaf metadata body.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] for unreadable bodies and
/// [`FetchError::Provider`] when the service answered with an error document.
pub fn parse_leaf_metadata(format: GeoviewLayerType, body: MetadataBody) -> Result<Value, FetchError> {
    let document = json_body(body)?;
    if format.is_esri() { esri::check_payload(document) } else { Ok(document) }
}

/// Interprets fetched metadata for one leaf.
///
/// `leaf_metadata` is the per-leaf document, when one was fetched.
#[must_use]
pub fn interpret_leaf_metadata(
    format: GeoviewLayerType,
    layer_id: &LayerId,
    leaf_metadata: Option<&Value>,
    service_metadata: Option<&Value>,
) -> LeafMetadataOutcome {
    match format {
        GeoviewLayerType::EsriDynamic | GeoviewLayerType::EsriFeature => {
            leaf_metadata.map_or(LeafMetadataOutcome::Overlay(Value::Null), esri::interpret_layer)
        }
        GeoviewLayerType::EsriImage => {
            service_metadata.map_or(LeafMetadataOutcome::Overlay(Value::Null), esri::interpret_layer)
        }
        GeoviewLayerType::OgcWms => wms::interpret(layer_id, service_metadata),
        GeoviewLayerType::OgcWfs => wfs::interpret(layer_id, leaf_metadata, service_metadata),
        GeoviewLayerType::OgcFeature => ogc_api::interpret(layer_id, leaf_metadata, service_metadata),
        GeoviewLayerType::Csv
        | GeoviewLayerType::GeoJson
        | GeoviewLayerType::Kml
        | GeoviewLayerType::Wkb
        | GeoviewLayerType::GeoPackage
        | GeoviewLayerType::Shapefile
        | GeoviewLayerType::GeoTiff => file::interpret(layer_id, service_metadata),
        GeoviewLayerType::ImageStatic
        | GeoviewLayerType::XyzTiles
        | GeoviewLayerType::VectorTiles
        | GeoviewLayerType::GeoCore => LeafMetadataOutcome::Overlay(Value::Null),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a body as JSON, parsing text bodies.
fn json_body(body: MetadataBody) -> Result<Value, FetchError> {
    match body {
        MetadataBody::Json(value) => Ok(value),
        MetadataBody::Text(text) => {
            serde_json::from_str(&text).map_err(|err| FetchError::Parse(err.to_string()))
        }
    }
}

/// Reads a body as text.
fn text_body(body: MetadataBody) -> Result<String, FetchError> {
    match body {
        MetadataBody::Text(text) => Ok(text),
        MetadataBody::Json(_) => Err(FetchError::Parse("expected an XML document".to_string())),
    }
}

/// Appends query parameters to a URL with `?` or `&`.
fn with_query(base: &str, query: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}

/// Returns the first child element with the given local name.
fn child_element<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children().find(|child| child.is_element() && child.tag_name().name() == name)
}

/// Returns the trimmed text of the first child element with `name`.
fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Converts a CRS identifier in URN, URL, or `EPSG:n` form to `EPSG:n`.
fn epsg_code(crs: &str) -> Option<String> {
    let code = crs.trim().rsplit([':', '/']).next()?;
    (!code.is_empty() && code.chars().all(|ch| ch.is_ascii_digit())).then(|| format!("EPSG:{code}"))
}

/// Returns true when two layer ids match, ignoring a namespace prefix.
fn same_layer_name(candidate: &str, layer_id: &LayerId) -> bool {
    let id = layer_id.as_str();
    candidate == id
        || candidate.rsplit_once(':').is_some_and(|(_, local)| local == id)
        || id.rsplit_once(':').is_some_and(|(_, local)| local == candidate)
}
