// crates/geoview-config/src/schema.rs
// ============================================================================
// Module: Layer Config Schemas
// Description: JSON schema builders for geoview layer, entry, and map configs.
// Purpose: Provide one input and one internal schema fragment per schema path.
// Dependencies: geoview-core, serde_json
// ============================================================================

//! ## Overview
//! Every schema path (`geoviewLayer`, `layers/group`, `layers/<format>`, `map`)
//! has two fragments. The input fragment is lenient and checks raw user JSON
//! before construction. The internal fragment is strict and checks the
//! serialized node after default layering. Fragments are self-contained so
//! each one compiles on its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use geoview_core::EntryType;
use geoview_core::GEOVIEW_LAYER_SCHEMA_PATH;
use geoview_core::GROUP_SCHEMA_PATH;
use geoview_core::GeoviewLayerType;
use geoview_core::MAP_SCHEMA_PATH;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON schema draft used by every fragment.
const SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";
/// Layer statuses accepted by internal fragments.
const LAYER_STATUSES: [&str; 5] = ["registered", "processing", "processed", "error", "cancelled"];
/// Projections supported by the map view.
pub(crate) const SUPPORTED_PROJECTIONS: [u32; 2] = [3857, 3978];

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Returns every known schema path.
#[must_use]
pub fn schema_paths() -> Vec<&'static str> {
    let mut paths = vec![GEOVIEW_LAYER_SCHEMA_PATH, GROUP_SCHEMA_PATH, MAP_SCHEMA_PATH];
    paths.extend(
        GeoviewLayerType::ALL
            .into_iter()
            .filter(|kind| kind.leaf_entry_type().is_some())
            .map(GeoviewLayerType::leaf_schema_path),
    );
    paths
}

/// Returns the lenient input fragment for a schema path.
#[must_use]
pub fn input_schema(schema_path: &str) -> Option<Value> {
    match schema_path {
        GEOVIEW_LAYER_SCHEMA_PATH => Some(geoview_layer_input_schema()),
        GROUP_SCHEMA_PATH => Some(group_input_schema()),
        MAP_SCHEMA_PATH => Some(map_input_schema()),
        _ => leaf_format(schema_path).map(leaf_input_schema),
    }
}

/// Returns the strict internal fragment for a schema path.
#[must_use]
pub fn internal_schema(schema_path: &str) -> Option<Value> {
    match schema_path {
        GEOVIEW_LAYER_SCHEMA_PATH => Some(geoview_layer_internal_schema()),
        GROUP_SCHEMA_PATH => Some(group_internal_schema()),
        MAP_SCHEMA_PATH => Some(map_internal_schema()),
        _ => leaf_format(schema_path).map(leaf_internal_schema),
    }
}

/// Returns the full schema document with every fragment under `$defs`.
#[must_use]
pub fn schema_document() -> Value {
    let mut input = serde_json::Map::new();
    let mut internal = serde_json::Map::new();
    for path in schema_paths() {
        if let Some(schema) = input_schema(path) {
            input.insert(path.to_string(), schema);
        }
        if let Some(schema) = internal_schema(path) {
            internal.insert(path.to_string(), schema);
        }
    }
    json!({
        "$schema": SCHEMA_DRAFT,
        "$id": "geoview://schemas/layer-config.schema.json",
        "title": "GeoView Layer Configuration",
        "description": "Input and internal schema fragments keyed by schema path.",
        "$defs": {
            "input": Value::Object(input),
            "internal": Value::Object(internal)
        }
    })
}

/// Maps a `layers/<format>` schema path to its leaf format.
fn leaf_format(schema_path: &str) -> Option<GeoviewLayerType> {
    GeoviewLayerType::ALL
        .into_iter()
        .filter(|kind| kind.leaf_entry_type().is_some())
        .find(|kind| kind.leaf_schema_path() == schema_path)
}

// ============================================================================
// SECTION: Geoview Layer
// ============================================================================

/// Input fragment for a raw geoview layer config.
fn geoview_layer_input_schema() -> Value {
    let labels: Vec<&str> = GeoviewLayerType::ALL.iter().map(|kind| kind.as_str()).collect();
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Geoview layer config (input)",
        "type": "object",
        "required": ["geoviewLayerId", "geoviewLayerType"],
        "properties": {
            "geoviewLayerId": schema_for_non_empty_string("Unique geoview layer id."),
            "geoviewLayerType": {
                "type": "string",
                "enum": labels,
                "description": "Source format of the geoview layer."
            },
            "geoviewLayerName": schema_for_string("Display name."),
            "metadataAccessPath": schema_for_non_empty_string("Service or file base path."),
            "serviceDateFormat": schema_for_string("Date format used by the service."),
            "externalDateFormat": schema_for_string("Date format shown to users."),
            "isTimeAware": { "type": "boolean" },
            "initialSettings": initial_settings_schema(),
            "listOfLayerEntryConfig": {
                "type": "array",
                "items": { "type": "object" }
            }
        },
        "if": {
            "properties": { "geoviewLayerType": { "const": "geoCore" } }
        },
        "else": {
            "required": ["listOfLayerEntryConfig"]
        }
    })
}

/// Internal fragment for a resolved geoview layer config.
fn geoview_layer_internal_schema() -> Value {
    let labels: Vec<&str> = GeoviewLayerType::ALL
        .iter()
        .filter(|kind| kind.leaf_entry_type().is_some())
        .map(|kind| kind.as_str())
        .collect();
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Geoview layer config (internal)",
        "type": "object",
        "required": ["geoviewLayerId", "geoviewLayerType", "initialSettings", "listOfLayerEntryConfig"],
        "properties": {
            "geoviewLayerId": schema_for_non_empty_string("Unique geoview layer id."),
            "geoviewLayerType": { "type": "string", "enum": labels },
            "geoviewLayerName": schema_for_string("Display name."),
            "metadataAccessPath": schema_for_non_empty_string("Service or file base path."),
            "externalDateFormat": schema_for_string("Date format shown to users."),
            "isTimeAware": { "type": "boolean" },
            "initialSettings": initial_settings_schema(),
            "listOfLayerEntryConfig": {
                "type": "array",
                "items": { "type": "object", "required": ["layerId", "layerPath", "entryType"] }
            },
            "error": { "type": "object" }
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Group Entries
// ============================================================================

/// Input fragment for a raw group entry.
fn group_input_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Group layer entry (input)",
        "type": "object",
        "required": ["layerId", "listOfLayerEntryConfig"],
        "properties": {
            "layerId": layer_id_input_schema(),
            "layerName": schema_for_string("Display name."),
            "entryType": { "const": "group" },
            "isMetadataLayerGroup": { "type": "boolean" },
            "initialSettings": initial_settings_schema(),
            "listOfLayerEntryConfig": {
                "type": "array",
                "items": { "type": "object" }
            }
        }
    })
}

/// Internal fragment for a resolved group entry.
fn group_internal_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Group layer entry (internal)",
        "type": "object",
        "required": [
            "layerId",
            "layerPath",
            "entryType",
            "schemaTag",
            "layerStatus",
            "isLayerEntryError",
            "initialSettings",
            "isMetadataLayerGroup"
        ],
        "properties": {
            "layerId": schema_for_non_empty_string("Entry id."),
            "layerPath": layer_path_schema(),
            "layerName": schema_for_string("Display name."),
            "entryType": { "const": EntryType::Group.as_str() },
            "schemaTag": { "const": GROUP_SCHEMA_PATH },
            "layerStatus": { "enum": LAYER_STATUSES },
            "isLayerEntryError": { "const": false },
            "initialSettings": initial_settings_schema(),
            "isMetadataLayerGroup": { "type": "boolean" },
            "minScale": schema_for_scale(),
            "maxScale": schema_for_scale(),
            "listOfLayerEntryConfig": { "type": "array" }
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Leaf Entries
// ============================================================================

/// Input fragment for a raw leaf entry of `format`.
fn leaf_input_schema(format: GeoviewLayerType) -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": format!("{format} layer entry (input)"),
        "type": "object",
        "required": ["layerId"],
        "properties": {
            "layerId": layer_id_input_schema(),
            "layerName": schema_for_string("Display name."),
            "entryType": { "type": "string" },
            "source": source_input_schema(format),
            "initialSettings": initial_settings_schema(),
            "layerFilter": schema_for_string("Attribute filter expression."),
            "style": { "type": "object" },
            "minScale": schema_for_scale(),
            "maxScale": schema_for_scale(),
            "temporalDimension": temporal_dimension_schema()
        }
    })
}

/// Internal fragment for a resolved leaf entry of `format`.
fn leaf_internal_schema(format: GeoviewLayerType) -> Value {
    let entry_type = format.leaf_entry_type().map_or("", EntryType::as_str);
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": format!("{format} layer entry (internal)"),
        "type": "object",
        "required": [
            "layerId",
            "layerPath",
            "entryType",
            "schemaTag",
            "layerStatus",
            "isLayerEntryError",
            "initialSettings",
            "source"
        ],
        "properties": {
            "layerId": schema_for_non_empty_string("Entry id."),
            "layerPath": layer_path_schema(),
            "layerName": schema_for_string("Display name."),
            "entryType": { "const": entry_type },
            "schemaTag": { "const": format.leaf_schema_path() },
            "layerStatus": { "enum": LAYER_STATUSES },
            "isLayerEntryError": { "const": false },
            "initialSettings": initial_settings_schema(),
            "source": source_internal_schema(format),
            "layerFilter": { "type": "string" },
            "style": { "type": "object" },
            "minScale": schema_for_scale(),
            "maxScale": schema_for_scale(),
            "temporalDimension": temporal_dimension_schema()
        },
        "additionalProperties": false
    })
}

/// Input schema for the `source` object.
fn source_input_schema(format: GeoviewLayerType) -> Value {
    let mut schema = source_properties_schema();
    if format == GeoviewLayerType::Csv
        && let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut)
    {
        properties.insert(
            "separator".to_string(),
            json!({ "type": "string", "minLength": 1, "maxLength": 1 }),
        );
    }
    schema
}

/// Internal schema for the resolved `source` object.
fn source_internal_schema(format: GeoviewLayerType) -> Value {
    let mut schema = source_properties_schema();
    let mut required = vec![Value::from("dataAccessPath")];
    if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        if let Some(label) = source_format_label(format) {
            properties.insert("format".to_string(), json!({ "const": label }));
            required.push(Value::from("format"));
        }
        if format == GeoviewLayerType::Csv {
            properties.insert(
                "separator".to_string(),
                json!({ "type": "string", "minLength": 1, "maxLength": 1 }),
            );
            required.push(Value::from("separator"));
        }
    }
    if let Some(object) = schema.as_object_mut() {
        object.insert("required".to_string(), Value::Array(required));
        object.insert("additionalProperties".to_string(), Value::Bool(false));
    }
    schema
}

/// Shared `source` properties.
fn source_properties_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dataAccessPath": schema_for_non_empty_string("Path or URL of the layer data."),
            "format": schema_for_string("Renderer data format."),
            "dataProjection": {
                "type": "string",
                "pattern": "^EPSG:[0-9]+$",
                "description": "Projection of the source data."
            },
            "separator": schema_for_string("Column separator."),
            "crossOrigin": { "type": "string", "enum": ["anonymous", "use-credentials"] },
            "strategy": { "type": "string", "enum": ["all", "bbox"] },
            "serverType": { "type": "string", "enum": ["mapserver", "geoserver", "qgis", "esri"] },
            "wmsStyle": schema_for_string("WMS style name."),
            "postSettings": { "type": "object" },
            "featureInfo": feature_info_schema()
        }
    })
}

/// Renderer format label fixed for a leaf format, when any.
pub(crate) const fn source_format_label(format: GeoviewLayerType) -> Option<&'static str> {
    match format {
        GeoviewLayerType::Csv => Some("CSV"),
        GeoviewLayerType::GeoJson => Some("GeoJSON"),
        GeoviewLayerType::Kml => Some("KML"),
        GeoviewLayerType::Wkb => Some("WKB"),
        GeoviewLayerType::GeoPackage => Some("GeoPackage"),
        GeoviewLayerType::Shapefile => Some("shapefile"),
        GeoviewLayerType::GeoTiff => Some("GeoTIFF"),
        GeoviewLayerType::EsriFeature => Some("EsriJSON"),
        GeoviewLayerType::OgcFeature => Some("featureAPI"),
        GeoviewLayerType::OgcWfs => Some("WFS"),
        GeoviewLayerType::VectorTiles => Some("MVT"),
        GeoviewLayerType::EsriDynamic
        | GeoviewLayerType::EsriImage
        | GeoviewLayerType::ImageStatic
        | GeoviewLayerType::XyzTiles
        | GeoviewLayerType::OgcWms
        | GeoviewLayerType::GeoCore => None,
    }
}

/// Schema for feature info settings.
fn feature_info_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "queryable": { "type": "boolean" },
            "nameField": schema_for_string("Feature display name field."),
            "outfields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "type"],
                    "properties": {
                        "name": schema_for_non_empty_string("Field name."),
                        "alias": schema_for_string("Field alias."),
                        "type": {
                            "type": "string",
                            "enum": ["string", "number", "date", "oid", "url"]
                        }
                    }
                }
            }
        }
    })
}

/// Schema for a time dimension.
fn temporal_dimension_schema() -> Value {
    json!({
        "type": "object",
        "required": ["field"],
        "properties": {
            "field": schema_for_non_empty_string("Time field or dimension name."),
            "default": { "type": "string" },
            "range": { "type": "array", "items": { "type": "string" } },
            "singleHandle": { "type": "boolean" }
        }
    })
}

// ============================================================================
// SECTION: Map
// ============================================================================

/// Input fragment for the `map` section of a map feature config.
fn map_input_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Map config (input)",
        "type": "object",
        "properties": {
            "interaction": { "type": "string", "enum": ["dynamic", "static"] },
            "viewSettings": view_settings_schema(),
            "basemapOptions": basemap_options_schema(),
            "listOfGeoviewLayerConfig": {
                "type": "array",
                "items": { "type": "object" }
            },
            "extraOptions": { "type": "object" }
        }
    })
}

/// Internal fragment for the resolved `map` section.
fn map_internal_schema() -> Value {
    json!({
        "$schema": SCHEMA_DRAFT,
        "title": "Map config (internal)",
        "type": "object",
        "required": ["interaction", "viewSettings", "basemapOptions"],
        "properties": {
            "interaction": { "type": "string", "enum": ["dynamic", "static"] },
            "viewSettings": view_settings_schema(),
            "basemapOptions": basemap_options_schema(),
            "listOfGeoviewLayerConfig": { "type": "array" },
            "extraOptions": { "type": "object" }
        },
        "additionalProperties": false
    })
}

/// Schema for the map view settings.
fn view_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "projection": { "type": "integer", "enum": SUPPORTED_PROJECTIONS },
            "initialView": {
                "type": "object",
                "properties": {
                    "zoomAndCenter": {
                        "type": "array",
                        "prefixItems": [
                            { "type": "number", "minimum": 0, "maximum": 50 },
                            {
                                "type": "array",
                                "items": { "type": "number" },
                                "minItems": 2,
                                "maxItems": 2
                            }
                        ],
                        "minItems": 2,
                        "maxItems": 2
                    },
                    "extent": schema_for_extent()
                }
            },
            "minZoom": { "type": "number", "minimum": 0, "maximum": 50 },
            "maxZoom": { "type": "number", "minimum": 0, "maximum": 50 },
            "maxExtent": schema_for_extent(),
            "enableRotation": { "type": "boolean" },
            "rotation": { "type": "number", "minimum": 0, "maximum": 360 }
        }
    })
}

/// Schema for basemap options.
fn basemap_options_schema() -> Value {
    json!({
        "type": "object",
        "required": ["basemapId"],
        "properties": {
            "basemapId": {
                "type": "string",
                "enum": ["transport", "osm", "simple", "nogeom", "shaded", "imagery"]
            },
            "shaded": { "type": "boolean" },
            "labeled": { "type": "boolean" }
        }
    })
}

// ============================================================================
// SECTION: Shared Fragments
// ============================================================================

/// Schema for display settings cascaded to entries.
fn initial_settings_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "states": {
                "type": "object",
                "properties": {
                    "visible": { "type": "boolean" },
                    "opacity": { "type": "number", "minimum": 0, "maximum": 1 },
                    "hoverable": { "type": "boolean" },
                    "queryable": { "type": "boolean" },
                    "legendCollapsed": { "type": "boolean" }
                }
            },
            "minZoom": { "type": "number", "minimum": 0, "maximum": 50 },
            "maxZoom": { "type": "number", "minimum": 0, "maximum": 50 },
            "extent": schema_for_extent(),
            "className": { "type": "string" }
        }
    })
}

/// Schema for a raw entry id; catalogue services often send integers.
fn layer_id_input_schema() -> Value {
    json!({
        "oneOf": [
            { "type": "string", "minLength": 1, "pattern": "^[^/]+$" },
            { "type": "integer", "minimum": 0 }
        ],
        "description": "Entry id, unique among siblings, without '/'."
    })
}

/// Schema for a derived layer path.
fn layer_path_schema() -> Value {
    json!({
        "type": "string",
        "pattern": "^[^/]+(/[^/]+)+$",
        "description": "Slash-joined ancestor ids starting with the geoview layer id."
    })
}

/// Schema for a scale denominator.
fn schema_for_scale() -> Value {
    json!({ "type": "number", "minimum": 0 })
}

/// Schema for a `[minx, miny, maxx, maxy]` extent.
fn schema_for_extent() -> Value {
    json!({
        "type": "array",
        "items": { "type": "number" },
        "minItems": 4,
        "maxItems": 4
    })
}

/// Schema for a required, non-empty string.
fn schema_for_non_empty_string(description: &str) -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "description": description
    })
}

/// Schema for an arbitrary string.
fn schema_for_string(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}
