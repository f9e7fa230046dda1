// crates/geoview-core/src/core/layer_types.rs
// ============================================================================
// Module: GeoView Layer Types
// Description: Closed enumerations for layer formats, entry types, and status.
// Purpose: Route nodes to schema fragments and renderers without type inspection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`GeoviewLayerType`] is the closed set of source formats a geoview layer can
//! use. Each leaf format fixes its [`EntryType`] and its schema path, so tree
//! consumers only need these tags to pick a rendering strategy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Schema Paths
// ============================================================================

/// Schema path of the geoview layer (root) fragment.
pub const GEOVIEW_LAYER_SCHEMA_PATH: &str = "geoviewLayer";
/// Schema path of the group entry fragment.
pub const GROUP_SCHEMA_PATH: &str = "layers/group";
/// Schema path of the map feature config fragment.
pub const MAP_SCHEMA_PATH: &str = "map";

// ============================================================================
// SECTION: Geoview Layer Type
// ============================================================================

/// Supported geoview layer source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeoviewLayerType {
    /// ESRI map service rendered server side.
    #[serde(rename = "esriDynamic")]
    EsriDynamic,
    /// ESRI feature layer queried as vector features.
    #[serde(rename = "esriFeature")]
    EsriFeature,
    /// ESRI image service.
    #[serde(rename = "esriImage")]
    EsriImage,
    /// Static georeferenced image.
    #[serde(rename = "imageStatic")]
    ImageStatic,
    /// GeoJSON file.
    #[serde(rename = "GeoJSON")]
    GeoJson,
    /// GeoPackage file.
    #[serde(rename = "GeoPackage")]
    GeoPackage,
    /// XYZ raster tiles.
    #[serde(rename = "xyzTiles")]
    XyzTiles,
    /// Vector tiles.
    #[serde(rename = "vectorTiles")]
    VectorTiles,
    /// OGC API Features collection.
    #[serde(rename = "ogcFeature")]
    OgcFeature,
    /// OGC Web Feature Service.
    #[serde(rename = "ogcWfs")]
    OgcWfs,
    /// OGC Web Map Service.
    #[serde(rename = "ogcWms")]
    OgcWms,
    /// Delimited text file with coordinate columns.
    #[serde(rename = "CSV")]
    Csv,
    /// KML file.
    #[serde(rename = "KML")]
    Kml,
    /// Well-known binary file.
    #[serde(rename = "WKB")]
    Wkb,
    /// Cloud optimized GeoTIFF.
    #[serde(rename = "GeoTIFF")]
    GeoTiff,
    /// Zipped shapefile.
    #[serde(rename = "shapefile")]
    Shapefile,
    /// GeoCore catalogue reference, expanded by a config reader.
    #[serde(rename = "geoCore")]
    GeoCore,
}

impl GeoviewLayerType {
    /// Every geoview layer type in declaration order.
    pub const ALL: [Self; 17] = [
        Self::EsriDynamic,
        Self::EsriFeature,
        Self::EsriImage,
        Self::ImageStatic,
        Self::GeoJson,
        Self::GeoPackage,
        Self::XyzTiles,
        Self::VectorTiles,
        Self::OgcFeature,
        Self::OgcWfs,
        Self::OgcWms,
        Self::Csv,
        Self::Kml,
        Self::Wkb,
        Self::GeoTiff,
        Self::Shapefile,
        Self::GeoCore,
    ];

    /// Returns the wire label of the layer type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EsriDynamic => "esriDynamic",
            Self::EsriFeature => "esriFeature",
            Self::EsriImage => "esriImage",
            Self::ImageStatic => "imageStatic",
            Self::GeoJson => "GeoJSON",
            Self::GeoPackage => "GeoPackage",
            Self::XyzTiles => "xyzTiles",
            Self::VectorTiles => "vectorTiles",
            Self::OgcFeature => "ogcFeature",
            Self::OgcWfs => "ogcWfs",
            Self::OgcWms => "ogcWms",
            Self::Csv => "CSV",
            Self::Kml => "KML",
            Self::Wkb => "WKB",
            Self::GeoTiff => "GeoTIFF",
            Self::Shapefile => "shapefile",
            Self::GeoCore => "geoCore",
        }
    }

    /// Parses a wire label into a layer type.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }

    /// Returns the entry type of leaves of this format.
    ///
    /// Returns `None` for [`GeoviewLayerType::GeoCore`], which never owns leaves.
    #[must_use]
    pub const fn leaf_entry_type(self) -> Option<EntryType> {
        match self {
            Self::EsriDynamic | Self::EsriImage | Self::ImageStatic | Self::OgcWms | Self::GeoTiff => {
                Some(EntryType::RasterImage)
            }
            Self::XyzTiles => Some(EntryType::RasterTile),
            Self::VectorTiles => Some(EntryType::VectorTile),
            Self::EsriFeature
            | Self::GeoJson
            | Self::GeoPackage
            | Self::OgcFeature
            | Self::OgcWfs
            | Self::Csv
            | Self::Kml
            | Self::Wkb => Some(EntryType::Vector),
            Self::Shapefile => Some(EntryType::Shapefile),
            Self::GeoCore => None,
        }
    }

    /// Returns the schema path of leaves of this format.
    #[must_use]
    pub const fn leaf_schema_path(self) -> &'static str {
        match self {
            Self::EsriDynamic => "layers/esriDynamic",
            Self::EsriFeature => "layers/esriFeature",
            Self::EsriImage => "layers/esriImage",
            Self::ImageStatic => "layers/imageStatic",
            Self::GeoJson => "layers/GeoJSON",
            Self::GeoPackage => "layers/GeoPackage",
            Self::XyzTiles => "layers/xyzTiles",
            Self::VectorTiles => "layers/vectorTiles",
            Self::OgcFeature => "layers/ogcFeature",
            Self::OgcWfs => "layers/ogcWfs",
            Self::OgcWms => "layers/ogcWms",
            Self::Csv => "layers/CSV",
            Self::Kml => "layers/KML",
            Self::Wkb => "layers/WKB",
            Self::GeoTiff => "layers/GeoTIFF",
            Self::Shapefile => "layers/shapefile",
            Self::GeoCore => "layers/geoCore",
        }
    }

    /// Returns true for the ESRI service family.
    #[must_use]
    pub const fn is_esri(self) -> bool {
        matches!(self, Self::EsriDynamic | Self::EsriFeature | Self::EsriImage)
    }
}

impl fmt::Display for GeoviewLayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Entry Type
// ============================================================================

/// Kind of node in a layer tree, used to route leaves to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Vector features rendered client side.
    #[serde(rename = "vector")]
    Vector,
    /// Vector tiles.
    #[serde(rename = "vector-tile")]
    VectorTile,
    /// Single raster image.
    #[serde(rename = "raster-image")]
    RasterImage,
    /// Tiled raster.
    #[serde(rename = "raster-tile")]
    RasterTile,
    /// Group of child entries.
    #[serde(rename = "group")]
    Group,
    /// GeoCore catalogue placeholder.
    #[serde(rename = "geoCore")]
    GeoCore,
    /// Zipped shapefile.
    #[serde(rename = "shapefile")]
    Shapefile,
}

impl EntryType {
    /// Returns the wire label of the entry type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::VectorTile => "vector-tile",
            Self::RasterImage => "raster-image",
            Self::RasterTile => "raster-tile",
            Self::Group => "group",
            Self::GeoCore => "geoCore",
            Self::Shapefile => "shapefile",
        }
    }
}

// ============================================================================
// SECTION: Layer Status
// ============================================================================

/// Resolution status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    /// Constructed, waiting for resolution.
    #[default]
    Registered,
    /// Metadata fetch or layering in progress.
    Processing,
    /// Fully resolved and validated.
    Processed,
    /// Terminal failure.
    Error,
    /// Terminal cancellation.
    Cancelled,
}

impl LayerStatus {
    /// Returns true when the status is terminal.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Processed | Self::Error | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Display Language
// ============================================================================

/// Language used for catalogue requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLanguage {
    /// English.
    #[default]
    En,
    /// French.
    Fr,
}

impl DisplayLanguage {
    /// Returns the two-letter language code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }
}

impl fmt::Display for DisplayLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
