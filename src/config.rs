//! Configuration module for mediashelf.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{MediaError, Result};

/// Bytes per megabyte for upload limits.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Environment variable overriding the asset root directory.
pub const ASSET_ROOT_ENV: &str = "MEDIASHELF_ASSET_ROOT";

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the HTTP API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
        }
    }
}

/// Asset storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Root directory for all assets, relative to the working directory
    /// unless absolute.
    #[serde(default = "default_asset_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// URL prefix under which the asset root is served.
    #[serde(default = "default_public_url_prefix")]
    pub public_url_prefix: String,
}

fn default_asset_root() -> String {
    "data/assets".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

fn default_public_url_prefix() -> String {
    "/files".to_string()
}

impl AssetsConfig {
    /// Create a configuration for the given root with default limits.
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// The root directory as a path.
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Maximum upload size in bytes, saturating on absurd settings.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_asset_root(),
            max_upload_size_mb: default_max_upload_size(),
            public_url_prefix: default_public_url_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mediashelf.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Asset storage configuration.
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(MediaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MediaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MEDIASHELF_ASSET_ROOT`: Override the asset root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var(ASSET_ROOT_ENV) {
            if !root.is_empty() {
                self.assets.root = root;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.assets.root.trim().is_empty() {
            return Err(MediaError::Config("assets.root must not be empty".to_string()));
        }
        if self.assets.max_upload_size_mb == 0 {
            return Err(MediaError::Config(
                "assets.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        if !self.assets.public_url_prefix.starts_with('/') {
            return Err(MediaError::Config(
                "assets.public_url_prefix must start with '/'".to_string(),
            ));
        }
        let prefix = self.assets.public_url_prefix.trim_end_matches('/');
        if prefix.is_empty()
            || prefix == "/api"
            || prefix.starts_with("/api/")
            || prefix == "/health"
        {
            return Err(MediaError::Config(
                "assets.public_url_prefix must not be '/' or shadow the API routes".to_string(),
            ));
        }
        Ok(())
    }
}
