//! Environment driven configuration
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LoggingConfig;

pub const DB_PATH_VAR: &str = "GRANT_LEDGER_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "GRANT_LEDGER_LOG_LEVEL";
pub const PROFILE_TIMEOUT_VAR: &str = "GRANT_LEDGER_PROFILE_TIMEOUT_MS";
pub const ROLE_TIMEOUT_VAR: &str = "GRANT_LEDGER_ROLE_TIMEOUT_MS";
pub const PAGE_SIZE_VAR: &str = "GRANT_LEDGER_PAGE_SIZE";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_PROFILE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ROLE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PAGE_SIZE: usize = 10;

/// Source of environment variables, injectable so tests never touch the process environment.
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl EnvironmentProvider for MapEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    pub profile_timeout: Duration,
    pub role_timeout: Duration,
    pub page_size: usize,
}

impl Config {
    pub fn from_env(env: &impl EnvironmentProvider) -> Result<Self, ConfigError> {
        let db_path = env
            .get_var(DB_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DB_PATH_VAR))?;

        let log_level = env
            .get_var(LOG_LEVEL_VAR)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let profile_timeout = Duration::from_millis(number(env, PROFILE_TIMEOUT_VAR, DEFAULT_PROFILE_TIMEOUT_MS)?);
        let role_timeout = Duration::from_millis(number(env, ROLE_TIMEOUT_VAR, DEFAULT_ROLE_TIMEOUT_MS)?);

        let page_size = number(env, PAGE_SIZE_VAR, DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                var: PAGE_SIZE_VAR,
                value: "0".into(),
            });
        }

        Ok(Self {
            db_path,
            log_level,
            profile_timeout,
            role_timeout,
            page_size,
        })
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            log_level: self.log_level.clone(),
        }
    }
}

fn number<T: std::str::FromStr>(env: &impl EnvironmentProvider, var: &'static str, default: T) -> Result<T, ConfigError> {
    match env.get_var(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_the_path_is_set() {
        let env = MapEnvironment::empty().with_var(DB_PATH_VAR, "/var/lib/ledger");
        let config = Config::from_env(&env).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/ledger"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.profile_timeout, Duration::from_secs(10));
        assert_eq!(config.role_timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn missing_db_path_halts() {
        let err = Config::from_env(&MapEnvironment::empty()).unwrap_err();
        assert_eq!(err, ConfigError::Missing(DB_PATH_VAR));
        assert_eq!(err.to_string(), "GRANT_LEDGER_DB_PATH must be set");
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let env = MapEnvironment::empty()
            .with_var(DB_PATH_VAR, "db")
            .with_var(ROLE_TIMEOUT_VAR, "soon");
        assert_eq!(
            Config::from_env(&env).unwrap_err(),
            ConfigError::Invalid {
                var: ROLE_TIMEOUT_VAR,
                value: "soon".into()
            }
        );

        let env = MapEnvironment::empty().with_var(DB_PATH_VAR, "db").with_var(PAGE_SIZE_VAR, "0");
        assert!(matches!(Config::from_env(&env), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn overrides_are_read() {
        let env = MapEnvironment::empty()
            .with_var(DB_PATH_VAR, "db")
            .with_var(LOG_LEVEL_VAR, "grant_ledger=debug")
            .with_var(PROFILE_TIMEOUT_VAR, "250")
            .with_var(PAGE_SIZE_VAR, " 25 ");
        let config = Config::from_env(&env).unwrap();

        assert_eq!(config.logging().log_level, "grant_ledger=debug");
        assert_eq!(config.profile_timeout, Duration::from_millis(250));
        assert_eq!(config.page_size, 25);
    }
}
