//! Configuration module for the order splitter.
//!
//! Loads a YAML file with environment variable interpolation and validates
//! it. Every field has a default, so an empty file (or no file at all, via
//! [`load_config_or_default`]) yields a runnable service.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_splitter::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod engine;
mod observability;
mod server;

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::EngineConfig;
pub use observability::{LOG_FORMATS, LoggingConfig, ObservabilityConfig};
pub use server::ServerConfig;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Apply `HTTP_PORT` / `PORT` overrides, in that order of precedence.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_port_override(mut self) -> Self {
        let port = ["HTTP_PORT", "PORT"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| value.trim().parse::<u16>().ok());
        if let Some(port) = port {
            self.server.http_port = port;
        }
        self
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// # Errors
///
/// Returns a `ConfigError` if an existing file cannot be read, parsed, or
/// validated.
pub fn load_config_or_default(path: Option<&str>) -> Result<Config, ConfigError> {
    match load_config(path) {
        Err(ConfigError::ReadError { source, .. }) if source.kind() == ErrorKind::NotFound => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
        other => other,
    }
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.bind_address.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "server.request_timeout_secs must be positive".to_string(),
        ));
    }

    if config.server.max_body_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_body_bytes must be positive".to_string(),
        ));
    }

    if config.engine.min_parallel_goals == 0 {
        return Err(ConfigError::ValidationError(
            "engine.min_parallel_goals must be at least 1".to_string(),
        ));
    }

    let logging = &config.observability.logging;
    if logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "observability.logging.level must not be empty".to_string(),
        ));
    }

    if !LOG_FORMATS.contains(&logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {LOG_FORMATS:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.engine.min_parallel_goals, 8);
        assert_eq!(config.engine.max_threads, 0);
        assert_eq!(config.observability.logging.level, "info");
        assert_eq!(config.observability.logging.format, "json");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_minimal_config() {
        let yaml = r"
server:
  http_port: 9000
";

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };
        assert_eq!(config.server.http_port, 9000);
        assert_eq!(config.server.bind_address, "0.0.0.0"); // Default value
        assert_eq!(config.engine.min_parallel_goals, 8);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_string("").unwrap();
        assert_eq!(config.server.http_port, 8080);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "format: ${SPLITTER_CONFIG_TEST_NONEXISTENT_VAR:-compact}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "format: compact");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        // PATH should always exist
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "level: ${SPLITTER_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "level: ");
    }

    #[test]
    fn test_interpolated_yaml_is_parsed() {
        let yaml = r"
engine:
  max_threads: ${SPLITTER_CONFIG_TEST_THREADS_UNSET:-4}
";

        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.engine.max_threads, 4);
    }

    #[test]
    fn test_validation_zero_parallel_threshold() {
        let yaml = r"
engine:
  min_parallel_goals: 0
";

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for zero threshold");
        };
        assert!(err.to_string().contains("min_parallel_goals"));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let yaml = r"
server:
  request_timeout_secs: 0
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for zero timeout");
        };
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_validation_invalid_log_format() {
        let yaml = r"
observability:
  logging:
    format: xml
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for invalid format");
        };
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let result = load_config_from_string("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  http_port: 7070\nengine:\n  max_threads: 2").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.http_port, 7070);
        assert_eq!(config.engine.max_threads, 2);
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.yaml");
        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.engine.min_parallel_goals, 8);
        assert!(LOG_FORMATS.contains(&config.observability.logging.format.as_str()));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let result = load_config(path.to_str());
        let Err(ConfigError::ReadError { path: reported, .. }) = result else {
            panic!("expected read error");
        };
        assert!(reported.ends_with("absent.yaml"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let config = load_config_or_default(path.to_str()).unwrap();
        assert_eq!(config.server.http_port, 8080);
    }

    #[test]
    fn test_invalid_file_does_not_fall_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  min_parallel_goals: 0").unwrap();

        let result = load_config_or_default(file.path().to_str());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
