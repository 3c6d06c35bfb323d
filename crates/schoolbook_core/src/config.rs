//! Runtime configuration read from the process environment.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Only the `production` profile seeds sample data at startup.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const PROFILE_ENV: &str = "SCHOOLBOOK_PROFILE";
pub const DB_PATH_ENV: &str = "SCHOOLBOOK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "SCHOOLBOOK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "SCHOOLBOOK_LOG_DIR";

/// Named environment the process runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    Production,
    #[default]
    Development,
    Test,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }

    /// Whether the startup seeder is active under this profile.
    pub fn seeds_sample_data(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownProfile(String),
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProfile(value) => write!(
                f,
                "{PROFILE_ENV}=`{value}` is not one of production|development|test"
            ),
            Self::InvalidLogLevel(value) => {
                write!(f, "{LOG_LEVEL_ENV}=`{value}` is not a known log level")
            }
            Self::RelativeLogDir(path) => {
                write!(f, "{LOG_DIR_ENV} must be absolute, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Effective process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub profile: Profile,
    /// `None` runs against a private in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Reads configuration from the real process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let profile = match read(PROFILE_ENV) {
            Some(value) => value.parse::<Profile>()?,
            None => Profile::default(),
        };

        let log_level = match read(LOG_LEVEL_ENV) {
            Some(value) => {
                normalize_level(&value).map_err(|_| ConfigError::InvalidLogLevel(value))?
            }
            None => default_log_level(),
        };

        let log_dir = match read(LOG_DIR_ENV).map(PathBuf::from) {
            Some(path) if !path.is_absolute() => return Err(ConfigError::RelativeLogDir(path)),
            other => other,
        };

        Ok(Self {
            profile,
            db_path: read(DB_PATH_ENV).map(PathBuf::from),
            log_level,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, Profile, LOG_DIR_ENV, LOG_LEVEL_ENV, PROFILE_ENV};
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.profile, Profile::Development);
        assert!(config.db_path.is_none());
        assert!(config.log_dir.is_none());
        assert!(!config.profile.seeds_sample_data());
    }

    #[test]
    fn production_profile_enables_seeding() {
        let config = config_from(&[(PROFILE_ENV, " Production ")]).unwrap();
        assert_eq!(config.profile, Profile::Production);
        assert!(config.profile.seeds_sample_data());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            config_from(&[(PROFILE_ENV, "staging")]).unwrap_err(),
            ConfigError::UnknownProfile("staging".to_string())
        );
        assert!(matches!(
            config_from(&[(LOG_LEVEL_ENV, "loud")]).unwrap_err(),
            ConfigError::InvalidLogLevel(_)
        ));
        assert!(matches!(
            config_from(&[(LOG_DIR_ENV, "logs")]).unwrap_err(),
            ConfigError::RelativeLogDir(_)
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(PROFILE_ENV, "  "), (LOG_LEVEL_ENV, "warning")]).unwrap();
        assert_eq!(config.profile, Profile::Development);
        assert_eq!(config.log_level, "warn");
    }
}
