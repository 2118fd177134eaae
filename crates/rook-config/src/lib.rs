//! # Rook Configuration
//!
//! YAML configuration for the rook resolver, with TOML and JSON accepted
//! as alternatives. Every section has working defaults; an empty file
//! yields a server listening on port 53 that resolves from the built-in
//! root hints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod resolver;

pub use resolver::ResolverConfig;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings.
    pub server: ServerConfig,

    /// Resolution settings.
    pub resolver: ResolverConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        Ok(config)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.resolver.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// UDP listen addresses.
    pub listen: Vec<SocketAddr>,

    /// Reply sent when resolution fails.
    pub on_failure: FailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: vec![SocketAddr::from((Ipv4Addr::UNSPECIFIED, 53))],
            on_failure: FailurePolicy::Drop,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listen.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.listen".to_string(),
                message: "at least one address is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Reply sent when resolution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Send nothing.
    #[default]
    Drop,
    /// Send SERVFAIL.
    Servfail,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Drop => write!(f, "drop"),
            FailurePolicy::Servfail => write!(f, "servfail"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,

    /// Log format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    const LEVELS: [&'static str; 5] = ["trace", "debug", "info", "warn", "error"];

    pub fn validate(&self) -> Result<()> {
        if !Self::LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                message: format!("expected one of {}", Self::LEVELS.join(", ")),
            });
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen, vec!["0.0.0.0:53".parse().unwrap()]);
        assert_eq!(config.server.on_failure, FailurePolicy::Drop);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            r#"
server:
  listen: ["127.0.0.1:5353", "[::1]:5353"]
  on_failure: servfail
resolver:
  max_iterations: 5
logging:
  format: json
"#,
        )
        .unwrap();

        assert_eq!(config.server.listen.len(), 2);
        assert_eq!(config.server.on_failure, FailurePolicy::Servfail);
        assert_eq!(config.resolver.max_iterations, 5);
        assert_eq!(config.resolver.timeout_ms, 2000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("rook.toml");
        std::fs::write(
            &toml_path,
            "[resolver]\ntimeout_ms = 500\nroot_hints = [\"127.0.0.1\"]\n",
        )
        .unwrap();
        let config = Config::from_file(&toml_path).unwrap();
        assert_eq!(config.resolver.timeout_ms, 500);
        assert_eq!(config.resolver.root_hints.len(), 1);

        let json_path = dir.path().join("rook.json");
        std::fs::write(&json_path, r#"{"logging": {"level": "debug"}}"#).unwrap();
        let config = Config::from_file(&json_path).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_from_file_defaults_to_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resolver:\n  upstream_port: 5300").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.resolver.upstream_port, 5300);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("server: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_failure_policy_names() {
        let policy: FailurePolicy = serde_json::from_str("\"servfail\"").unwrap();
        assert_eq!(policy, FailurePolicy::Servfail);
        assert!(serde_json::from_str::<FailurePolicy>("\"refuse\"").is_err());
        assert_eq!(FailurePolicy::default(), FailurePolicy::Drop);
        assert_eq!(FailurePolicy::Servfail.to_string(), "servfail");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.server.listen.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut config = Config::default();
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }
}
