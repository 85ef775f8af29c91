//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use impersonate_auth::SYSTEM_TARGET;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure.
///
/// # Example
///
/// ```
/// use impersonate_runtime::config::ImpersonateConfig;
///
/// let config = ImpersonateConfig::default();
/// assert!(config.rebind_entities);
/// assert_eq!(config.supervisor.sweep_interval_ms, 1000);
/// assert_eq!(config.cache.role_ttl_secs, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImpersonateConfig {
    /// Re-bind entity values into the caller's session.
    pub rebind_entities: bool,

    /// Target that is always accessible; empty disables the rule.
    pub system_target: String,

    pub supervisor: SupervisorConfig,

    pub cache: CacheConfig,
}

impl Default for ImpersonateConfig {
    fn default() -> Self {
        Self {
            rebind_entities: true,
            system_target: SYSTEM_TARGET.to_string(),
            supervisor: SupervisorConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ImpersonateConfig {
    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Returns the system target, or `None` when disabled.
    #[must_use]
    pub fn system_target(&self) -> Option<&str> {
        if self.system_target.is_empty() {
            None
        } else {
            Some(&self.system_target)
        }
    }

    /// Rejects zero intervals, TTLs and capacities.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("supervisor.sweep_interval_ms", self.supervisor.sweep_interval_ms),
            ("cache.role_ttl_secs", self.cache.role_ttl_secs),
            ("cache.role_capacity", self.cache.role_capacity),
            (
                "cache.default_target_ttl_secs",
                self.cache.default_target_ttl_secs,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

/// Session supervisor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// How often to check for closed outer sessions.
    pub sweep_interval_ms: u64,

    /// How long shutdown waits for the sweeper to finish.
    pub drain_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1000,
            drain_timeout_ms: 10_000,
        }
    }
}

impl SupervisorConfig {
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Identity cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub role_ttl_secs: u64,

    /// Maximum number of usernames with cached roles.
    pub role_capacity: u64,

    pub default_target_ttl_secs: u64,

    /// Consult the directory's suspension flag on role cache hits.
    pub recheck_suspension: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            role_ttl_secs: 300,
            role_capacity: 100,
            default_target_ttl_secs: 600,
            recheck_suspension: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ImpersonateConfig::default();
        assert_eq!(config.system_target(), Some("system"));
        assert_eq!(config.supervisor.sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.supervisor.drain_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.role_capacity, 100);
        assert_eq!(config.cache.default_target_ttl_secs, 600);
        assert!(config.cache.recheck_suspension);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ImpersonateConfig::from_toml(
            r#"
[cache]
role_ttl_secs = 60
"#,
        )
        .expect("parse");
        assert_eq!(config.cache.role_ttl_secs, 60);
        assert_eq!(config.cache.role_capacity, 100);
        assert_eq!(config.supervisor, SupervisorConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = ImpersonateConfig::default();
        config.supervisor.sweep_interval_ms = 250;
        let parsed = ImpersonateConfig::from_toml(&config.to_toml().expect("serialize"))
            .expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_system_target_disables_rule() {
        let config = ImpersonateConfig {
            system_target: String::new(),
            ..ImpersonateConfig::default()
        };
        assert_eq!(config.system_target(), None);
    }

    #[test]
    fn zero_values_rejected() {
        let mut config = ImpersonateConfig::default();
        config.supervisor.sweep_interval_ms = 0;
        let err = config.validate().expect_err("zero interval");
        assert!(err.to_string().contains("supervisor.sweep_interval_ms"));

        let mut config = ImpersonateConfig::default();
        config.cache.role_capacity = 0;
        let err = config.validate().expect_err("zero capacity");
        assert!(err.to_string().contains("cache.role_capacity"));
    }
}
