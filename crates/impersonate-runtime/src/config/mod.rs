//! Configuration with layered loading.
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. Environment Variables (IMPERSONATE_*) │  Runtime override
//! ├───────────────────────────────────────────┤
//! │  2. Config file (TOML)                    │  Deployment settings
//! ├───────────────────────────────────────────┤
//! │  3. Default Values (compile-time)         │  Fallback
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `IMPERSONATE_SWEEP_INTERVAL_MS` | `supervisor.sweep_interval_ms` | u64 |
//! | `IMPERSONATE_DRAIN_TIMEOUT_MS` | `supervisor.drain_timeout_ms` | u64 |
//! | `IMPERSONATE_ROLE_TTL_SECS` | `cache.role_ttl_secs` | u64 |
//! | `IMPERSONATE_ROLE_CAPACITY` | `cache.role_capacity` | u64 |
//! | `IMPERSONATE_DEFAULT_TARGET_TTL_SECS` | `cache.default_target_ttl_secs` | u64 |
//! | `IMPERSONATE_RECHECK_SUSPENSION` | `cache.recheck_suspension` | bool |
//! | `IMPERSONATE_SYSTEM_TARGET` | `system_target` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! rebind_entities = true
//! system_target = "system"
//!
//! [supervisor]
//! sweep_interval_ms = 1000
//! drain_timeout_ms = 10000
//!
//! [cache]
//! role_ttl_secs = 300
//! role_capacity = 100
//! default_target_ttl_secs = 600
//! recheck_suspension = true
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{CacheConfig, ImpersonateConfig, SupervisorConfig};
