// crates/geoview-config/src/map_feature.rs
// ============================================================================
// Module: Map Feature Config
// Description: Map-level configuration aggregating every geoview layer.
// Purpose: Apply map defaults and drive layer resolution for a whole map.
// Dependencies: futures, geoview-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`MapFeatureConfig`] is the top-level configuration of one map. The `map`
//! section is validated against the `map` input fragment, map-level defaults
//! are applied through serde, and the resolved result is checked against the
//! strict `map` fragment. Raw geoview layers are resolved by
//! [`MapFeatureConfig::resolve_layers`]; `geoCore` roots are first expanded
//! through a [`LayerConfigReader`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::slice;

use futures::future::join_all;
use geoview_core::AbortSignal;
use geoview_core::EntryConfig;
use geoview_core::GeoviewLayerId;
use geoview_core::GeoviewLayerType;
use geoview_core::LayerConfigReader;
use geoview_core::LayerPath;
use geoview_core::MAP_SCHEMA_PATH;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::geoview_layer::GeoviewLayerConfig;
use crate::geoview_layer::parse_geoview_layer_id;
use crate::resolver::ErrorCallback;
use crate::resolver::LayerConfigResolver;
use crate::settings::DEFAULT_GEOCORE_URL;
use crate::validator::SchemaValidator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default theme.
const DEFAULT_THEME: &str = "geo.ca";
/// Default map projection (Canada Atlas Lambert).
const DEFAULT_PROJECTION: u32 = 3978;
/// Default basemap id.
const DEFAULT_BASEMAP_ID: &str = "transport";

// ============================================================================
// SECTION: Map Section
// ============================================================================

/// Map interaction mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapInteraction {
    /// Panning, zooming, and querying are enabled.
    #[default]
    Dynamic,
    /// The map is a static picture.
    Static,
}

/// View settings of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    /// EPSG code of the map projection.
    #[serde(default = "default_projection")]
    pub projection: u32,
    /// Initial zoom and center, or extent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_view: Option<Value>,
    /// Minimum zoom level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    /// Maximum zoom level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    /// Extent the view cannot leave.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_extent: Option<Vec<f64>>,
    /// True when users may rotate the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_rotation: Option<bool>,
    /// Initial rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            projection: default_projection(),
            initial_view: None,
            min_zoom: None,
            max_zoom: None,
            max_extent: None,
            enable_rotation: None,
            rotation: None,
        }
    }
}

/// Basemap selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasemapOptions {
    /// Basemap id.
    #[serde(default = "default_basemap_id")]
    pub basemap_id: String,
    /// True for a hill-shaded basemap.
    #[serde(default = "default_true")]
    pub shaded: bool,
    /// True when labels are drawn.
    #[serde(default = "default_true")]
    pub labeled: bool,
}

impl Default for BasemapOptions {
    fn default() -> Self {
        Self {
            basemap_id: default_basemap_id(),
            shaded: true,
            labeled: true,
        }
    }
}

/// The `map` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /// Interaction mode.
    #[serde(default)]
    pub interaction: MapInteraction,
    /// View settings.
    #[serde(default)]
    pub view_settings: ViewSettings,
    /// Basemap selection.
    #[serde(default)]
    pub basemap_options: BasemapOptions,
    /// Raw geoview layer configs, in z-order.
    #[serde(default)]
    pub list_of_geoview_layer_config: Vec<Value>,
    /// Free-form options passed to the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_options: Option<Value>,
}

/// External service endpoints used by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUrls {
    /// GeoCore catalogue endpoint.
    #[serde(default = "default_geocore_url")]
    pub geocore_url: String,
    /// Proxy for services without CORS support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            geocore_url: default_geocore_url(),
            proxy_url: None,
        }
    }
}

// ============================================================================
// SECTION: Map Feature Config
// ============================================================================

/// Configuration of one map and its resolved layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeatureConfig {
    /// Map section.
    #[serde(default)]
    pub map: MapConfig,
    /// Display theme.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Navigation bar buttons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_bar: Option<Value>,
    /// Application bar tabs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_bar: Option<Value>,
    /// Footer bar tabs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_bar: Option<Value>,
    /// Overview map options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview_map: Option<Value>,
    /// Enabled viewer components.
    #[serde(default)]
    pub components: Vec<String>,
    /// Enabled core packages.
    #[serde(default)]
    pub core_packages: Vec<String>,
    /// External package descriptors.
    #[serde(default)]
    pub external_packages: Vec<Value>,
    /// Service endpoints.
    #[serde(default)]
    pub service_urls: ServiceUrls,
    /// Schema version the config was written against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version_used: Option<String>,
    /// Resolved geoview layers, in z-order.
    #[serde(skip)]
    layers: Vec<GeoviewLayerConfig>,
}

impl Default for MapFeatureConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            theme: default_theme(),
            nav_bar: None,
            app_bar: None,
            footer_bar: None,
            overview_map: None,
            components: Vec::new(),
            core_packages: Vec::new(),
            external_packages: Vec::new(),
            service_urls: ServiceUrls::default(),
            schema_version_used: None,
            layers: Vec::new(),
        }
    }
}

impl MapFeatureConfig {
    /// Validates a raw map feature config and applies map-level defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the `map` section fails its input
    /// or internal fragment, and [`ConfigError::Parse`] when the document
    /// does not deserialize.
    pub fn prevalidate(raw: &Value, validator: &SchemaValidator) -> Result<Self, ConfigError> {
        if !raw.is_object() {
            return Err(ConfigError::Invalid("map feature config must be a JSON object".to_string()));
        }
        if let Some(map) = raw.get("map")
            && !validator.validate(MAP_SCHEMA_PATH, map, false)
        {
            let errors = validator.validation_errors(MAP_SCHEMA_PATH, map, false);
            return Err(ConfigError::Invalid(format!("map: {}", errors.join("; "))));
        }
        let config: Self = serde_json::from_value(raw.clone())
            .map_err(|err| ConfigError::Parse(format!("map feature config: {err}")))?;
        let resolved_map = serde_json::to_value(&config.map)
            .map_err(|err| ConfigError::Parse(format!("map: {err}")))?;
        if !validator.validate(MAP_SCHEMA_PATH, &resolved_map, true) {
            let errors = validator.validation_errors(MAP_SCHEMA_PATH, &resolved_map, true);
            return Err(ConfigError::Invalid(format!("map: {}", errors.join("; "))));
        }
        Ok(config)
    }

    /// Resolves every raw geoview layer of the map.
    ///
    /// `geoCore` roots are expanded through `reader` first; without a reader
    /// they resolve to errored roots. Reader failures are reported through
    /// `on_error` like any other failure.
    pub async fn resolve_layers(
        &mut self,
        resolver: &LayerConfigResolver,
        reader: Option<&dyn LayerConfigReader>,
        signal: &AbortSignal,
        on_error: ErrorCallback<'_>,
    ) {
        let expanded =
            expand_geocore(&self.map.list_of_geoview_layer_config, resolver, reader, signal, on_error).await;
        self.layers = resolver.prevalidate_geoview_layers_config(&expanded, signal, on_error).await;
    }

    /// Adds and resolves one geoview layer at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the raw layer has no id and
    /// [`ConfigError::Invalid`] when the id is already on the map.
    pub async fn add_layer(
        &mut self,
        resolver: &LayerConfigResolver,
        reader: Option<&dyn LayerConfigReader>,
        raw: Value,
        signal: &AbortSignal,
        on_error: ErrorCallback<'_>,
    ) -> Result<(), ConfigError> {
        let id = parse_geoview_layer_id(&raw)?;
        if self.geoview_layer(&id).is_some() {
            return Err(ConfigError::Invalid(format!("geoview layer {id} is already on the map")));
        }
        let expanded = expand_geocore(slice::from_ref(&raw), resolver, reader, signal, on_error).await;
        for candidate in &expanded {
            if let Some(config) = resolver.resolve_geoview_layer(candidate, signal, on_error).await {
                self.layers.push(config);
            }
        }
        self.map.list_of_geoview_layer_config.push(raw);
        Ok(())
    }

    /// Removes a geoview layer and its raw config; returns the removed root.
    pub fn remove_layer(&mut self, geoview_layer_id: &GeoviewLayerId) -> Option<GeoviewLayerConfig> {
        self.map
            .list_of_geoview_layer_config
            .retain(|raw| parse_geoview_layer_id(raw).ok().as_ref() != Some(geoview_layer_id));
        let index = self.layers.iter().position(|layer| layer.geoview_layer_id() == geoview_layer_id)?;
        Some(self.layers.remove(index))
    }

    /// Returns the resolved geoview layers in z-order.
    #[must_use]
    pub fn layers(&self) -> &[GeoviewLayerConfig] {
        &self.layers
    }

    /// Returns a resolved geoview layer by id.
    #[must_use]
    pub fn geoview_layer(&self, geoview_layer_id: &GeoviewLayerId) -> Option<&GeoviewLayerConfig> {
        self.layers.iter().find(|layer| layer.geoview_layer_id() == geoview_layer_id)
    }

    /// Looks up an entry anywhere on the map by layer path.
    #[must_use]
    pub fn layer_config(&self, layer_path: &LayerPath) -> Option<&EntryConfig> {
        let id = GeoviewLayerId::new(layer_path.geoview_layer_segment());
        self.geoview_layer(&id).and_then(|layer| layer.layer_config(layer_path))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Replaces each `geoCore` root by the configs its reader returns.
///
/// Reads run concurrently; output keeps the position of each `geoCore` root.
async fn expand_geocore(
    raw_list: &[Value],
    resolver: &LayerConfigResolver,
    reader: Option<&dyn LayerConfigReader>,
    signal: &AbortSignal,
    on_error: ErrorCallback<'_>,
) -> Vec<Value> {
    let Some(reader) = reader else {
        return raw_list.to_vec();
    };
    let language = resolver.settings().geocore.language;
    let reads = join_all(raw_list.iter().map(|raw| async move {
        if !is_geocore(raw) {
            return None;
        }
        let uuid = parse_geoview_layer_id(raw).ok()?;
        Some(reader.read_layer_configs(&[uuid.as_str().to_string()], language, signal).await)
    }))
    .await;
    let mut expanded = Vec::with_capacity(raw_list.len());
    for (raw, read) in raw_list.iter().zip(reads) {
        match read {
            None => expanded.push(raw.clone()),
            Some(outcome) => {
                for error in &outcome.errors {
                    on_error(error);
                }
                expanded.extend(outcome.layers);
            }
        }
    }
    expanded
}

/// Returns true for a raw `geoCore` root.
fn is_geocore(raw: &Value) -> bool {
    raw.get("geoviewLayerType").and_then(Value::as_str) == Some(GeoviewLayerType::GeoCore.as_str())
}

/// Default theme.
fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

/// Default projection.
const fn default_projection() -> u32 {
    DEFAULT_PROJECTION
}

/// Default basemap id.
fn default_basemap_id() -> String {
    DEFAULT_BASEMAP_ID.to_string()
}

/// Serde default for flags that start enabled.
const fn default_true() -> bool {
    true
}

/// Default GeoCore endpoint.
fn default_geocore_url() -> String {
    DEFAULT_GEOCORE_URL.to_string()
}
