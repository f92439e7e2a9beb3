//! Configuration management for svcatlas
//!
//! Settings come from environment variables with sensible defaults, or from a
//! TOML file. The central piece is the stage table mapping each deployment
//! stage to the URL of its service registry.
//!
//! # Environment Variables
//!
//! - `SVCATLAS_STAGES`: comma-separated `stage=url` pairs, e.g.
//!   `dev=http://dev-registry:8761/eureka/apps,prod=http://prod-registry:8761/eureka/apps`
//! - `SVCATLAS_OFFLINE_MODE`: skip all registry calls (true|false) - default: "false"
//! - `SVCATLAS_REQUEST_TIMEOUT`: registry request timeout in seconds - default: "30"
//! - `SVCATLAS_LOG_LEVEL`: logging level - default: "info"
//!
//! # Config File
//!
//! ```toml
//! offline_mode = false
//! request_timeout_secs = 30
//! log_level = "info"
//!
//! [stages]
//! dev = "http://dev-registry:8761/eureka/apps"
//! prod = "http://prod-registry:8761/eureka/apps"
//! ```
//!
//! `SVCATLAS_OFFLINE_MODE` overrides the file's `offline_mode`, so a checked-in
//! config can be used on a disconnected machine.
//!
//! # Example
//!
//! ```no_run
//! use svcatlas::SvcatlasConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SvcatlasConfig::from_env()?;
//! for stage in config.stages.keys() {
//!     println!("{}", stage);
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_OFFLINE_MODE: bool = false;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_STAGES: &str = "SVCATLAS_STAGES";
pub const ENV_OFFLINE_MODE: &str = "SVCATLAS_OFFLINE_MODE";
pub const ENV_REQUEST_TIMEOUT: &str = "SVCATLAS_REQUEST_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "SVCATLAS_LOG_LEVEL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main configuration structure for svcatlas
///
/// `Default::default()` loads from environment variables with fallback
/// defaults, silently skipping values that do not parse. Use
/// [`SvcatlasConfig::from_env`] for strict loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SvcatlasConfig {
    /// Stage name to registry URL
    pub stages: BTreeMap<String, String>,

    /// Return empty results without contacting any registry
    pub offline_mode: bool,

    /// Registry request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// On-disk layout; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    stages: BTreeMap<String, String>,
    offline_mode: Option<bool>,
    request_timeout_secs: Option<u64>,
    log_level: Option<String>,
}

impl Default for SvcatlasConfig {
    fn default() -> Self {
        let stages = env::var(ENV_STAGES)
            .ok()
            .and_then(|v| parse_stages(&v).ok())
            .unwrap_or_default();

        let offline_mode = env_offline_mode().unwrap_or(DEFAULT_OFFLINE_MODE);

        let request_timeout_secs = env::var(ENV_REQUEST_TIMEOUT)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let log_level = env::var(ENV_LOG_LEVEL)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            stages,
            offline_mode,
            request_timeout_secs,
            log_level,
        }
    }
}

fn env_offline_mode() -> Option<bool> {
    env::var(ENV_OFFLINE_MODE)
        .ok()
        .and_then(|v| v.trim().to_lowercase().parse::<bool>().ok())
}

/// Parses `stage=url` pairs separated by commas
///
/// Blank entries are ignored. A stage listed twice keeps its last URL.
///
/// # Errors
///
/// Returns `ConfigError::ParseError` for an entry without `=`, or with an
/// empty stage name or URL.
pub fn parse_stages(input: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut stages = BTreeMap::new();

    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (stage, url) = entry
            .split_once('=')
            .map(|(stage, url)| (stage.trim(), url.trim()))
            .filter(|(stage, url)| !stage.is_empty() && !url.is_empty())
            .ok_or_else(|| ConfigError::ParseError {
                field: ENV_STAGES.to_string(),
                error: format!("expected stage=url, got \"{}\"", entry),
            })?;

        stages.insert(stage.to_string(), url.to_string());
    }

    Ok(stages)
}

impl SvcatlasConfig {
    /// Loads configuration from the environment, failing on malformed values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SVCATLAS_STAGES` cannot be parsed or the
    /// resulting configuration does not validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_STAGES) {
            config.stages = parse_stages(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file
    ///
    /// Missing keys fall back to built-in defaults, not to the environment,
    /// with the exception of `SVCATLAS_OFFLINE_MODE`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid TOML,
    /// contains unknown keys, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            field: "config file".to_string(),
            error: e.to_string(),
        })?;

        let offline_mode = env_offline_mode()
            .or(file.offline_mode)
            .unwrap_or(DEFAULT_OFFLINE_MODE);

        Ok(Self {
            stages: file.stages,
            offline_mode,
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: file
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        })
    }

    /// Validates the configuration
    ///
    /// Checks that:
    /// - The timeout is between 1 second and 10 minutes
    /// - The log level is valid
    /// - Every stage name is non-blank and every URL is an absolute http(s) URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        for (stage, url) in &self.stages {
            if stage.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "Stage names must not be blank".to_string(),
                ));
            }

            let parsed = Url::parse(url).map_err(|e| {
                ConfigError::ValidationFailed(format!(
                    "Invalid registry URL for stage {}: {} ({})",
                    stage, url, e
                ))
            })?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::ValidationFailed(format!(
                    "Registry URL for stage {} must use http or https: {}",
                    stage, url
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for SvcatlasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Svcatlas Configuration:")?;
        writeln!(f, "  Offline Mode: {}", self.offline_mode)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        if self.stages.is_empty() {
            writeln!(f, "  Stages: (none)")?;
        } else {
            writeln!(f, "  Stages:")?;
            for (stage, url) in &self.stages {
                writeln!(f, "    {} -> {}", stage, url)?;
            }
        }
        Ok(())
    }
}
