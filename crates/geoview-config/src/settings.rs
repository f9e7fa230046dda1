// crates/geoview-config/src/settings.rs
// ============================================================================
// Module: Resolver Settings
// Description: TOML settings for metadata fetching, resolution, and GeoCore access.
// Purpose: Provide strict, fail-closed settings parsing with hard limits.
// Dependencies: geoview-core, serde, toml
// ============================================================================

//! ## Overview
//! Settings are loaded from a TOML file or string. Every section is optional
//! and falls back to defaults; present values are range-checked and invalid
//! settings fail closed. No environment variables are consulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::path::Path;

use geoview_core::DisplayLanguage;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum settings file size in bytes.
pub(crate) const MAX_SETTINGS_FILE_SIZE: u64 = 256 * 1024;
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Default connect timeout in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Maximum connect timeout in milliseconds.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 30_000;
/// Default maximum metadata response size in bytes.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Minimum allowed response size limit in bytes.
pub(crate) const MIN_MAX_RESPONSE_BYTES: usize = 1024;
/// Maximum allowed response size limit in bytes.
pub(crate) const MAX_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Default user agent for metadata requests.
pub(crate) const DEFAULT_USER_AGENT: &str = "geoview-config/0.1";
/// Default maximum layer tree depth.
pub(crate) const DEFAULT_MAX_TREE_DEPTH: usize = 8;
/// Maximum allowed layer tree depth.
pub(crate) const MAX_TREE_DEPTH: usize = 32;
/// Default GeoCore service base URL.
pub(crate) const DEFAULT_GEOCORE_URL: &str = "https://geocore.api.geo.ca";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Top-level resolver settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSettings {
    /// Metadata HTTP settings.
    #[serde(default)]
    pub http: HttpSettings,
    /// Tree resolution settings.
    #[serde(default)]
    pub resolution: ResolutionSettings,
    /// GeoCore catalogue settings.
    #[serde(default)]
    pub geocore: GeocoreSettings,
}

impl ResolverSettings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let metadata = file.metadata().map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfigError::Invalid("settings file exceeds size limit".to_string()));
        }
        let mut bytes = Vec::new();
        file.take(MAX_SETTINGS_FILE_SIZE + 1)
            .read_to_end(&mut bytes)
            .map_err(|err| ConfigError::Io(err.to_string()))?;
        let size = u64::try_from(bytes.len())
            .map_err(|_| ConfigError::Invalid("settings file exceeds size limit".to_string()))?;
        if size > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfigError::Invalid("settings file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("settings file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http.validate()?;
        self.resolution.validate()?;
        self.geocore.validate()?;
        Ok(())
    }
}

/// Metadata HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum metadata response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent sent with metadata requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Allow cleartext `http://` URLs.
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
            allow_http: false,
        }
    }
}

impl HttpSettings {
    /// Validates HTTP settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
            )));
        }
        if !(MIN_TIMEOUT_MS..=MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "http.connect_timeout_ms must be between {MIN_TIMEOUT_MS} and \
                 {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if self.connect_timeout_ms > self.timeout_ms {
            return Err(ConfigError::Invalid(
                "http.connect_timeout_ms must not exceed http.timeout_ms".to_string(),
            ));
        }
        if !(MIN_MAX_RESPONSE_BYTES..=MAX_MAX_RESPONSE_BYTES).contains(&self.max_response_bytes)
        {
            return Err(ConfigError::Invalid(format!(
                "http.max_response_bytes must be between {MIN_MAX_RESPONSE_BYTES} and \
                 {MAX_MAX_RESPONSE_BYTES}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must be set".to_string()));
        }
        Ok(())
    }
}

/// Tree resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionSettings {
    /// Maximum nesting depth of layer entries, including metadata groups.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Validate resolved nodes against the internal schema fragments.
    #[serde(default = "default_validate_internal")]
    pub validate_internal: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            max_tree_depth: default_max_tree_depth(),
            validate_internal: default_validate_internal(),
        }
    }
}

impl ResolutionSettings {
    /// Validates resolution settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tree_depth == 0 || self.max_tree_depth > MAX_TREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "resolution.max_tree_depth must be between 1 and {MAX_TREE_DEPTH}"
            )));
        }
        Ok(())
    }
}

/// GeoCore catalogue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeocoreSettings {
    /// Base URL of the GeoCore service.
    #[serde(default = "default_geocore_url")]
    pub base_url: String,
    /// Language used for catalogue requests.
    #[serde(default)]
    pub language: DisplayLanguage,
}

impl Default for GeocoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocore_url(),
            language: DisplayLanguage::default(),
        }
    }
}

impl GeocoreSettings {
    /// Validates GeoCore settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid(
                "geocore.base_url must be an http(s) url".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default request timeout.
pub(crate) const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default connect timeout.
pub(crate) const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default response size limit.
pub(crate) const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default user agent.
pub(crate) fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Default maximum tree depth.
pub(crate) const fn default_max_tree_depth() -> usize {
    DEFAULT_MAX_TREE_DEPTH
}

/// Default internal validation flag.
pub(crate) const fn default_validate_internal() -> bool {
    true
}

/// Default GeoCore base URL.
pub(crate) fn default_geocore_url() -> String {
    DEFAULT_GEOCORE_URL.to_string()
}
