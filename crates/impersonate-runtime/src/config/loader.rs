//! Configuration loader.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file, if one was given and exists
//! 3. Environment variables (`IMPERSONATE_*`)
//!
//! Each layer overrides the previous. The merged result is validated
//! before it is returned.

use super::{ConfigError, ImpersonateConfig};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Helper macro for parsing boolean environment variables.
macro_rules! parse_env_bool {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Helper macro for parsing unsigned integer environment variables.
macro_rules! parse_env_u64 {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = u64::from_str(val.trim())
                .map_err(|_| ConfigError::invalid_env_var($var, "expected unsigned integer"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```
/// use impersonate_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .skip_env_vars()
///     .load()
///     .expect("defaults are valid");
/// assert_eq!(config.cache.role_capacity, 100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the config file. A missing file is ignored.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads, merges and validates configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, an environment variable is malformed, or validation fails.
    pub fn load(&self) -> Result<ImpersonateConfig, ConfigError> {
        let mut config = ImpersonateConfig::default();

        if let Some(ref path) = self.config_path {
            if let Some(file_config) = Self::load_file(path)? {
                debug!(path = %path.display(), "Loaded config file");
                config = file_config;
            }
        }

        if !self.skip_env {
            Self::apply_env_vars(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Option<ImpersonateConfig>, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

        let config =
            ImpersonateConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

        Ok(Some(config))
    }

    fn apply_env_vars(config: &mut ImpersonateConfig) -> Result<(), ConfigError> {
        parse_env_u64!(
            config.supervisor.sweep_interval_ms,
            "IMPERSONATE_SWEEP_INTERVAL_MS"
        );
        parse_env_u64!(
            config.supervisor.drain_timeout_ms,
            "IMPERSONATE_DRAIN_TIMEOUT_MS"
        );
        parse_env_u64!(config.cache.role_ttl_secs, "IMPERSONATE_ROLE_TTL_SECS");
        parse_env_u64!(config.cache.role_capacity, "IMPERSONATE_ROLE_CAPACITY");
        parse_env_u64!(
            config.cache.default_target_ttl_secs,
            "IMPERSONATE_DEFAULT_TARGET_TTL_SECS"
        );
        parse_env_bool!(
            config.cache.recheck_suspension,
            "IMPERSONATE_RECHECK_SUSPENSION"
        );

        if let Ok(val) = std::env::var("IMPERSONATE_SYSTEM_TARGET") {
            config.system_target = val;
        }

        Ok(())
    }
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
