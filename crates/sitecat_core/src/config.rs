//! Runtime configuration loaded from TOML.
//!
//! # Invariants
//! - Missing keys fall back to [`CoreConfig::default`].
//! - `allocation_attempts` is at least 1 after validation.
//! - `log_level` parses as a [`LogLevel`] after validation.

use crate::logging::{default_log_level, LogLevel};
use crate::service::DEFAULT_ALLOCATION_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "sitecat.db";

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Create attempts before an allocation conflict is escalated.
    pub allocation_attempts: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }
}

impl CoreConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allocation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "allocation_attempts must be at least 1".to_string(),
            ));
        }
        if let Err(err) = self.log_level.parse::<LogLevel>() {
            return Err(ConfigError::Invalid(err.to_string()));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Config loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.allocation_attempts, 3);
        assert_eq!(config.db_path, PathBuf::from("sitecat.db"));
    }

    #[test]
    fn explicit_keys_override_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
            db_path = "/srv/dig/catalog.db"
            log_level = "warn"
            allocation_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/dig/catalog.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.allocation_attempts, 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            CoreConfig::from_toml_str("allocation_attempts = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("log_dir = \"logs\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("log_level = \"loud\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitecat.toml");
        std::fs::write(&path, "allocation_attempts = 4\n").unwrap();
        assert_eq!(CoreConfig::load(&path).unwrap().allocation_attempts, 4);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            CoreConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
