//! Configuration management for the query API.
//!
//! Handles loading configuration from a TOML file. Command-line flags and
//! environment variables are layered on top by `cli`.

use crate::backend::ExecutionContext;
use crate::error::{ApiError, Result};
use crate::query::PollSettings;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Where queries run.
    #[serde(default)]
    pub athena: AthenaConfig,

    /// Stored query templates.
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Completion polling.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "0.0.0.0:8080".
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

/// Athena execution context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    #[serde(default = "default_catalog")]
    pub catalog: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_workgroup")]
    pub workgroup: String,
}

fn default_catalog() -> String {
    "AwsDataCatalog".to_string()
}

fn default_database() -> String {
    "default".to_string()
}

fn default_workgroup() -> String {
    "primary".to_string()
}

impl Default for AthenaConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            database: default_database(),
            workgroup: default_workgroup(),
        }
    }
}

impl AthenaConfig {
    /// Returns the execution context every submission uses.
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            catalog: self.catalog.clone(),
            database: self.database.clone(),
            workgroup: self.workgroup.clone(),
        }
    }
}

/// Template store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplatesConfig {
    /// `s3://bucket/prefix` or a local directory. Named templates are
    /// unavailable when unset.
    pub location: Option<String>,
}

/// Completion polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollingConfig {
    /// Converts to poll settings, rejecting a zero interval or timeout.
    pub fn settings(&self) -> Result<PollSettings> {
        if self.interval_secs == 0 {
            return Err(ApiError::config("polling.interval_secs must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::config("polling.timeout_secs must be greater than 0"));
        }
        Ok(PollSettings {
            interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-query-api")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ApiError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Parses the listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen_addr.parse().map_err(|e| {
            ApiError::config(format!(
                "Invalid listen address '{}': {e}",
                self.server.listen_addr
            ))
        })
    }
}
