//! Runtime configuration.
//!
//! Settings are deserialized from a TOML file. Loading is never fatal to
//! submission processing: [`Config::load_or_default`] reports failures and
//! retains defaults.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Directory connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// LDAP server URL, e.g. `ldap://dc.example.com`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Explicit users container DN. When set, RootDSE discovery is skipped.
    #[serde(default)]
    pub users_base: Option<String>,

    /// Query timeout in seconds (default: 5).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Top-level configuration for the submission handler.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Verbose decision reporting (default: true). Read once at handler
    /// construction and cached for the life of the handler.
    #[serde(default = "default_debug_log")]
    pub debug_log: bool,

    /// Directory connection settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

const fn default_debug_log() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    5
}

fn default_url() -> String {
    String::from("ldap://localhost")
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            users_base: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_log: default_debug_log(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Loads configuration, falling back to defaults if the file cannot be
    /// read or parsed. Failures are reported, never fatal.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration file {}", path.display());
                config
            }
            Err(err) => {
                warn!("Error loading configuration {}: {err}", path.display());
                Self::default()
            }
        }
    }
}
