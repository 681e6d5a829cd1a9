//! Console configuration resolved from environment variables.
//!
//! # Invariants
//! - Unset or blank variables fall back to their defaults.
//! - A set variable is validated, never silently replaced by a default.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORE_PATH_ENV: &str = "HBNB_STORE_PATH";
pub const LOG_LEVEL_ENV: &str = "HBNB_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "HBNB_LOG_DIR";
pub const DEFAULT_STORE_PATH: &str = "file.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyStorePath,
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStorePath => write!(f, "{STORE_PATH_ENV} cannot be empty"),
            Self::InvalidLogLevel(message) => write!(f, "{LOG_LEVEL_ENV}: {message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub store_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_path = match lookup(STORE_PATH_ENV) {
            None => PathBuf::from(DEFAULT_STORE_PATH),
            Some(raw) if raw.trim().is_empty() => return Err(ConfigError::EmptyStorePath),
            Some(raw) => PathBuf::from(raw.trim()),
        };

        let log_level = match lookup(LOG_LEVEL_ENV).filter(|raw| !raw.trim().is_empty()) {
            None => default_log_level(),
            Some(raw) => normalize_level(&raw).map_err(ConfigError::InvalidLogLevel)?,
        };

        let log_dir = match lookup(LOG_DIR_ENV).filter(|raw| !raw.trim().is_empty()) {
            None => default_log_dir(),
            Some(raw) => {
                let path = PathBuf::from(raw.trim());
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir(path));
                }
                path
            }
        };

        Ok(Self {
            store_path,
            log_level,
            log_dir,
        })
    }
}

fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join("hbnb").join("logs")
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ConsoleConfig, DEFAULT_STORE_PATH};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn resolve(pairs: &[(&str, &str)]) -> Result<ConsoleConfig, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        ConsoleConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.log_level, default_log_level());
        assert!(config.log_dir.is_absolute());
        assert!(config.log_dir.ends_with("hbnb/logs"));
    }

    #[test]
    fn explicit_values_are_normalized() {
        let log_dir = std::env::temp_dir().join("hbnb-config-test");
        let config = resolve(&[
            ("HBNB_STORE_PATH", " data/objects.json "),
            ("HBNB_LOG_LEVEL", "WARNING"),
            ("HBNB_LOG_DIR", log_dir.to_str().unwrap()),
        ])
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("data/objects.json"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, log_dir);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            resolve(&[("HBNB_STORE_PATH", "  ")]),
            Err(ConfigError::EmptyStorePath)
        );
        assert!(matches!(
            resolve(&[("HBNB_LOG_LEVEL", "loud")]),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            resolve(&[("HBNB_LOG_DIR", "relative/logs")]),
            Err(ConfigError::RelativeLogDir(_))
        ));
    }
}
