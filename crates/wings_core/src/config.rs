//! Runtime configuration for an adapter process.
//!
//! # Responsibility
//! - Describe which store to open, how to log, and under which name the
//!   adapter is registered.
//! - Load that description from JSON with every field defaulted.
//!
//! # Invariants
//! - A config returned by `from_json_str`/`from_path` has passed `validate()`.

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::logging::default_log_level;
use crate::registry::is_valid_adapter_name;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Adapter name used when the config does not provide one.
pub const DEFAULT_ADAPTER_NAME: &str = "wings";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WingsConfig {
    pub adapter_name: String,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Native store location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `None` opens an in-memory store.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. Logging stays off when unset.
    pub dir: Option<String>,
}

impl Default for WingsConfig {
    fn default() -> Self {
        Self {
            adapter_name: DEFAULT_ADAPTER_NAME.to_string(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

impl WingsConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !is_valid_adapter_name(self.adapter_name.trim()) {
            return Err(ConfigError::Invalid {
                field: "adapter_name",
                message: format!(
                    "`{}` must be non-empty lowercase ascii, digits, `_` or `-`",
                    self.adapter_name
                ),
            });
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "database.busy_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(dir) = self.logging.dir.as_deref() {
            if !Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "logging.dir",
                    message: format!("must be an absolute path, got `{dir}`"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, WingsConfig, DEFAULT_ADAPTER_NAME};

    #[test]
    fn empty_document_uses_defaults() {
        let config = WingsConfig::from_json_str("{}").unwrap();
        assert_eq!(config.adapter_name, DEFAULT_ADAPTER_NAME);
        assert!(config.database.path.is_none());
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn rejects_invalid_adapter_name() {
        let err = WingsConfig::from_json_str(r#"{"adapter_name": "Fedora Store"}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "adapter_name",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = WingsConfig::from_json_str(r#"{"solr_url": "http://localhost"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
