//! Structured logging setup for svcatlas
//!
//! Initializes the `tracing` subscriber once per process. Console output is
//! the default; JSON output is available for log shipping. `RUST_LOG` is
//! respected when set.
//!
//! # Example
//!
//! ```no_run
//! use svcatlas::util::logging;
//! use tracing::{info, warn};
//!
//! logging::init_logging(logging::LoggingConfig::from_env());
//!
//! info!(stage = "prod", "Loading services from registry");
//! warn!(stage = "prod", "Registry unavailable, returning empty map");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

const ENV_LOG_LEVEL: &str = "SVCATLAS_LOG_LEVEL";
const ENV_LOG_JSON: &str = "SVCATLAS_LOG_JSON";

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for svcatlas targets
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., svcatlas::registry::service) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ID and name in logs
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    /// INFO level, console output with targets, no location or thread IDs
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Reads `SVCATLAS_LOG_LEVEL` (default "info") and `SVCATLAS_LOG_JSON`
    /// (default false)
    pub fn from_env() -> Self {
        let level_str = env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());

        let use_json = env::var(ENV_LOG_JSON)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level: parse_level(&level_str),
            use_json,
            ..Default::default()
        }
    }
}

/// Parses a log level from a string, defaulting to INFO
///
/// # Example
///
/// ```
/// use svcatlas::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn directive(spec: &str) -> Option<Directive> {
    spec.parse().ok()
}

/// Builds the filter: svcatlas at the configured level, HTTP stack quieted
/// unless `RUST_LOG` says otherwise
fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();

    if let Some(own) = directive(&format!("svcatlas={}", level)) {
        filter = filter.add_directive(own);
    }

    if env::var("RUST_LOG").is_err() {
        for noisy in ["h2=warn", "hyper=warn", "reqwest=warn"] {
            if let Some(d) = directive(noisy) {
                filter = filter.add_directive(d);
            }
        }
    }

    filter
}

/// Initializes the logging system; subsequent calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_thread_ids(config.include_thread_ids)
                        .with_thread_names(config.include_thread_ids),
                )
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
        assert!(config.include_target);
        assert!(!config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var(ENV_LOG_LEVEL, "debug");
        std::env::set_var(ENV_LOG_JSON, "true");
        let config = LoggingConfig::from_env();
        std::env::remove_var(ENV_LOG_LEVEL);
        std::env::remove_var(ENV_LOG_JSON);

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert!(config.include_target);
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        std::env::remove_var(ENV_LOG_LEVEL);
        std::env::set_var(ENV_LOG_JSON, "not-a-bool");
        let config = LoggingConfig::from_env();
        std::env::remove_var(ENV_LOG_JSON);

        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
    }

    #[test]
    fn test_directives_parse() {
        assert!(directive("svcatlas=debug").is_some());
        assert!(directive("reqwest=warn").is_some());
    }
}
