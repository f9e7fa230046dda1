// crates/geoview-config/src/paths.rs
// ============================================================================
// Module: Data Access Paths
// Description: Per-format derivation and normalization of data access paths.
// Purpose: Turn partial user paths into concrete, idempotent data URLs.
// Dependencies: geoview-core
// ============================================================================

//! ## Overview
//! A data access path is *concrete* when it is a `blob:` URL, carries a query
//! string, ends with one of the format's file extensions, or (tile formats)
//! contains a `{z}` template. Concrete paths are returned untouched. Other
//! paths are derived from the data access path, or from the metadata access
//! path when absent, using the format's rule. Every rule is idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::GeoviewLayerType;
use geoview_core::LayerId;

use crate::error::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Image extensions accepted for static images.
const IMAGE_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".gif", ".tif", ".tiff", ".webp"];
/// ESRI service type segments that may be followed by a layer index.
const ESRI_SERVICE_SEGMENTS: [&str; 3] = ["featureserver", "mapserver", "imageserver"];
/// Extension of file-format metadata documents.
const META_EXTENSION: &str = ".meta";
/// XYZ tile template suffix.
const XYZ_TILE_SUFFIX: &str = "/tile/{z}/{y}/{x}";
/// Vector tile template suffix.
const VECTOR_TILE_SUFFIX: &str = "/tile/{z}/{y}/{x}.pbf";

// ============================================================================
// SECTION: Concreteness
// ============================================================================

/// Returns the file extensions recognized for a format, first one preferred.
#[must_use]
pub const fn format_extensions(format: GeoviewLayerType) -> &'static [&'static str] {
    match format {
        GeoviewLayerType::Csv => &[".csv"],
        GeoviewLayerType::GeoJson => &[".geojson", ".json"],
        GeoviewLayerType::Kml => &[".kml", ".kmz"],
        GeoviewLayerType::Wkb => &[".wkb"],
        GeoviewLayerType::GeoPackage => &[".gpkg"],
        GeoviewLayerType::Shapefile => &[".zip", ".shp"],
        GeoviewLayerType::GeoTiff => &[".tif", ".tiff"],
        GeoviewLayerType::ImageStatic => &IMAGE_EXTENSIONS,
        GeoviewLayerType::EsriDynamic
        | GeoviewLayerType::EsriFeature
        | GeoviewLayerType::EsriImage
        | GeoviewLayerType::XyzTiles
        | GeoviewLayerType::VectorTiles
        | GeoviewLayerType::OgcFeature
        | GeoviewLayerType::OgcWfs
        | GeoviewLayerType::OgcWms
        | GeoviewLayerType::GeoCore => &[],
    }
}

/// Returns true when `path` must not be modified for `format`.
#[must_use]
pub fn is_concrete(format: GeoviewLayerType, path: &str) -> bool {
    if path.starts_with("blob:") || path.contains('?') {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    if format_extensions(format).iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }
    match format {
        GeoviewLayerType::XyzTiles | GeoviewLayerType::VectorTiles => path.contains("{z}"),
        GeoviewLayerType::OgcFeature => lower.ends_with("/items"),
        _ => false,
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Derives the normalized data access path of a leaf.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when neither path is available and
/// [`ConfigError::UnsupportedLayerType`] for formats that own no leaves.
pub fn normalize_data_access_path(
    format: GeoviewLayerType,
    data_access_path: Option<&str>,
    metadata_access_path: Option<&str>,
    layer_id: &LayerId,
) -> Result<String, ConfigError> {
    let base = data_access_path
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .or_else(|| metadata_access_path.map(data_base_of_metadata).filter(|path| !path.is_empty()))
        .ok_or_else(|| ConfigError::MissingField("source.dataAccessPath".to_string()))?;
    if is_concrete(format, base) {
        return Ok(base.to_string());
    }
    let trimmed = base.trim_end_matches('/');
    let path = match format {
        GeoviewLayerType::Csv
        | GeoviewLayerType::GeoJson
        | GeoviewLayerType::Kml
        | GeoviewLayerType::Wkb
        | GeoviewLayerType::GeoPackage
        | GeoviewLayerType::Shapefile
        | GeoviewLayerType::GeoTiff => {
            let joined = join_segment(trimmed, layer_id.as_str());
            let extension = format_extensions(format).first().copied().unwrap_or_default();
            if is_concrete(format, &joined) { joined } else { format!("{joined}{extension}") }
        }
        GeoviewLayerType::ImageStatic => {
            if ends_with_segment(trimmed, layer_id.as_str()) {
                trimmed.to_string()
            } else {
                join_segment(trimmed, layer_id.as_str())
            }
        }
        GeoviewLayerType::EsriDynamic | GeoviewLayerType::EsriFeature | GeoviewLayerType::EsriImage => {
            format!("{}/", esri_service_base(trimmed))
        }
        GeoviewLayerType::OgcWms | GeoviewLayerType::OgcWfs => base.to_string(),
        GeoviewLayerType::OgcFeature => {
            let root = strip_suffix_ignore_case(trimmed, "/collections");
            format!("{root}/collections/{layer_id}/items")
        }
        GeoviewLayerType::XyzTiles => format!("{trimmed}{XYZ_TILE_SUFFIX}"),
        GeoviewLayerType::VectorTiles => format!("{trimmed}{VECTOR_TILE_SUFFIX}"),
        GeoviewLayerType::GeoCore => {
            return Err(ConfigError::UnsupportedLayerType(format.as_str().to_string()));
        }
    };
    Ok(path)
}

/// Trims a metadata access path; trailing slashes are dropped.
#[must_use]
pub fn normalize_metadata_access_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.contains('?') {
        return trimmed.to_string();
    }
    trimmed.trim_end_matches('/').to_string()
}

/// Strips a trailing layer index from an ESRI service URL.
///
/// `.../FeatureServer/3` becomes `.../FeatureServer`. Trailing slashes are
/// removed; other paths are returned unchanged.
#[must_use]
pub fn esri_service_base(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let mut segments = trimmed.rsplitn(3, '/');
    let last = segments.next().unwrap_or_default();
    let previous = segments.next().unwrap_or_default();
    let is_index = !last.is_empty() && last.chars().all(|ch| ch.is_ascii_digit());
    if is_index && ESRI_SERVICE_SEGMENTS.contains(&previous.to_ascii_lowercase().as_str()) {
        trimmed[..trimmed.len() - last.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the directory of a `.meta` metadata file, or the trimmed path.
fn data_base_of_metadata(path: &str) -> &str {
    let trimmed = path.trim();
    if trimmed.to_ascii_lowercase().ends_with(META_EXTENSION) {
        return trimmed.rsplit_once('/').map_or("", |(directory, _)| directory);
    }
    trimmed
}

/// Returns true when a metadata access path names a `.meta` file.
#[must_use]
pub fn is_meta_file(path: &str) -> bool {
    path.trim().to_ascii_lowercase().ends_with(META_EXTENSION)
}

/// Joins a segment to a base with exactly one slash.
fn join_segment(base: &str, segment: &str) -> String {
    let segment = segment.trim_start_matches('/');
    if base.is_empty() { segment.to_string() } else { format!("{base}/{segment}") }
}

/// Returns true when the last path segment equals `segment`.
fn ends_with_segment(path: &str, segment: &str) -> bool {
    path.rsplit('/').next().is_some_and(|last| last == segment)
}

/// Strips a suffix compared without case.
fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> &'a str {
    let lower = value.to_ascii_lowercase();
    if lower.ends_with(suffix) { &value[..value.len() - suffix.len()] } else { value }
}

#[cfg(test)]
mod tests;
