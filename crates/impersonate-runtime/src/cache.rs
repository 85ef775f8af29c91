//! Identity and default-target caches.
//!
//! # Structure
//!
//! ```text
//! IdentityCache
//! ├── roles:   Cache<username, Arc<roles>>   TTL 5 min, bounded (100)
//! └── default: Cache<"default", name>        TTL 10 min, one entry
//! ```
//!
//! Both caches are single-flight: concurrent misses for one key run the
//! computation once and every waiter observes its result. Failures are
//! never cached; they are handed to all waiters of that computation and
//! the next call recomputes.
//!
//! # Suspension
//!
//! Only role sets are cached, and only after the directory reported the
//! user as not suspended. With [`CachePolicy::recheck_suspension`] set, a
//! cache hit additionally asks [`UserDirectory::is_suspended`], so a user
//! suspended after caching is refused on the next call instead of after
//! the TTL.

use crate::config::CacheConfig;
use crate::error::ImpersonationError;
use impersonate_auth::{DefaultTargetProvider, Identity, UserDirectory};
use moka::sync::Cache;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Key of the single default-target entry.
const DEFAULT_TARGET_KEY: &str = "default";

/// Cache sizing and expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub role_ttl: Duration,
    pub role_capacity: u64,
    pub default_target_ttl: Duration,
    pub recheck_suspension: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            role_ttl: Duration::from_secs(config.role_ttl_secs),
            role_capacity: config.role_capacity,
            default_target_ttl: Duration::from_secs(config.default_target_ttl_secs),
            recheck_suspension: config.recheck_suspension,
        }
    }
}

/// Entry counts, after pending maintenance has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub roles: u64,
    pub default_target: u64,
}

/// Memoizing front of the user directory and default-target provider.
#[derive(Debug, Clone)]
pub struct IdentityCache {
    directory: Arc<dyn UserDirectory>,
    default_target: Arc<dyn DefaultTargetProvider>,
    roles: Cache<String, Arc<BTreeSet<String>>>,
    default: Cache<&'static str, String>,
    recheck_suspension: bool,
}

impl IdentityCache {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        default_target: Arc<dyn DefaultTargetProvider>,
        policy: CachePolicy,
    ) -> Self {
        let roles = Cache::builder()
            .max_capacity(policy.role_capacity)
            .time_to_live(policy.role_ttl)
            .build();
        let default = Cache::builder()
            .max_capacity(1)
            .time_to_live(policy.default_target_ttl)
            .build();

        Self {
            directory,
            default_target,
            roles,
            default,
            recheck_suspension: policy.recheck_suspension,
        }
    }

    /// Returns `username` with its current role set.
    ///
    /// # Errors
    ///
    /// - [`ImpersonationError::UnknownIdentity`] if the directory has no such user
    /// - [`ImpersonationError::SuspendedIdentity`] if the user is suspended
    /// - [`ImpersonationError::CacheComputation`] if the directory failed
    pub fn resolve_identity(&self, username: &str) -> Result<Identity, ImpersonationError> {
        if self.recheck_suspension {
            if let Some(roles) = self.roles.get(username) {
                self.recheck(username)?;
                return Ok(Identity::new(username, roles.iter().cloned()));
            }
        }

        let roles = self
            .roles
            .try_get_with(username.to_string(), || self.load_roles(username))
            .map_err(|e| (*e).clone())?;

        Ok(Identity::new(username, roles.iter().cloned()))
    }

    /// Returns the current default target name.
    ///
    /// # Errors
    ///
    /// [`ImpersonationError::CacheComputation`] if the provider failed.
    pub fn resolve_default_target(&self) -> Result<String, ImpersonationError> {
        self.default
            .try_get_with(DEFAULT_TARGET_KEY, || {
                let name = self
                    .default_target
                    .current_default_target()
                    .map_err(|e| ImpersonationError::from_directory(DEFAULT_TARGET_KEY, e))?;
                debug!(target_name = %name, "caching default target");
                Ok::<_, ImpersonationError>(name)
            })
            .map_err(|e| (*e).clone())
    }

    /// Drops the cached roles of one user.
    pub fn invalidate_user(&self, username: &str) {
        self.roles.invalidate(username);
    }

    /// Drops every cached entry, including the default target.
    pub fn invalidate_all(&self) {
        self.roles.invalidate_all();
        self.default.invalidate_all();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.roles.run_pending_tasks();
        self.default.run_pending_tasks();
        CacheStats {
            roles: self.roles.entry_count(),
            default_target: self.default.entry_count(),
        }
    }

    fn load_roles(&self, username: &str) -> Result<Arc<BTreeSet<String>>, ImpersonationError> {
        let record = self
            .directory
            .lookup_user(username)
            .map_err(|e| ImpersonationError::from_directory(username, e))?;

        if record.suspended {
            return Err(ImpersonationError::SuspendedIdentity {
                username: username.to_string(),
            });
        }

        let roles: BTreeSet<String> = record.roles.into_iter().collect();
        info!(username, roles = ?roles, "caching user roles");
        Ok(Arc::new(roles))
    }

    fn recheck(&self, username: &str) -> Result<(), ImpersonationError> {
        let suspended = self.directory.is_suspended(username).map_err(|e| {
            self.roles.invalidate(username);
            ImpersonationError::from_directory(username, e)
        })?;

        if suspended {
            self.roles.invalidate(username);
            return Err(ImpersonationError::SuspendedIdentity {
                username: username.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDefaultTarget, MemoryDirectory};

    fn policy(recheck_suspension: bool) -> CachePolicy {
        CachePolicy {
            recheck_suspension,
            ..CachePolicy::default()
        }
    }

    fn cache_with(directory: &Arc<MemoryDirectory>, recheck: bool) -> IdentityCache {
        IdentityCache::new(
            Arc::clone(directory) as Arc<dyn UserDirectory>,
            Arc::new(MemoryDefaultTarget::new("neo4j")),
            policy(recheck),
        )
    }

    #[test]
    fn hit_does_not_look_up_again() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        let cache = cache_with(&directory, true);

        let first = cache.resolve_identity("joe").expect("resolve");
        let second = cache.resolve_identity("joe").expect("resolve");

        assert_eq!(first, second);
        assert!(first.has_role("reader"));
        assert_eq!(directory.lookup_count(), 1);
        assert_eq!(directory.suspension_check_count(), 1);
    }

    #[test]
    fn unknown_user_is_not_cached() {
        let directory = Arc::new(MemoryDirectory::new());
        let cache = cache_with(&directory, true);

        for _ in 0..2 {
            let err = cache.resolve_identity("ghost").expect_err("unknown");
            assert!(matches!(err, ImpersonationError::UnknownIdentity { .. }));
        }
        assert_eq!(directory.lookup_count(), 2);
        assert_eq!(cache.stats().roles, 0);
    }

    #[test]
    fn suspended_at_lookup_is_never_cached() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        directory.set_suspended("joe", true);
        let cache = cache_with(&directory, false);

        let err = cache.resolve_identity("joe").expect_err("suspended");
        assert!(matches!(err, ImpersonationError::SuspendedIdentity { .. }));
        assert_eq!(cache.stats().roles, 0);

        directory.set_suspended("joe", false);
        assert!(cache.resolve_identity("joe").is_ok());
    }

    #[test]
    fn recheck_refuses_user_suspended_after_caching() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        let cache = cache_with(&directory, true);
        cache.resolve_identity("joe").expect("resolve");

        directory.set_suspended("joe", true);
        let err = cache.resolve_identity("joe").expect_err("suspended");
        assert!(matches!(err, ImpersonationError::SuspendedIdentity { .. }));
        assert_eq!(cache.stats().roles, 0);
    }

    #[test]
    fn without_recheck_cached_roles_outlive_suspension() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        let cache = cache_with(&directory, false);
        cache.resolve_identity("joe").expect("resolve");

        directory.set_suspended("joe", true);
        assert!(cache.resolve_identity("joe").is_ok());

        cache.invalidate_user("joe");
        assert!(cache.resolve_identity("joe").is_err());
    }

    #[test]
    fn directory_failure_is_cache_computation_failure() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        directory.set_unavailable(true);
        let cache = cache_with(&directory, true);

        let err = cache.resolve_identity("joe").expect_err("down");
        assert!(matches!(err, ImpersonationError::CacheComputation { .. }));

        directory.set_unavailable(false);
        assert!(cache.resolve_identity("joe").is_ok());
    }

    #[test]
    fn default_target_is_cached_once() {
        let provider = Arc::new(MemoryDefaultTarget::new("neo4j"));
        let cache = IdentityCache::new(
            Arc::new(MemoryDirectory::new()),
            Arc::clone(&provider) as Arc<dyn DefaultTargetProvider>,
            CachePolicy::default(),
        );

        assert_eq!(cache.resolve_default_target().expect("default"), "neo4j");
        provider.set("sales");
        assert_eq!(cache.resolve_default_target().expect("default"), "neo4j");
        assert_eq!(provider.read_count(), 1);
        assert_eq!(cache.stats().default_target, 1);

        cache.invalidate_all();
        assert_eq!(cache.resolve_default_target().expect("default"), "sales");
    }

    #[test]
    fn role_ttl_expiry_triggers_fresh_lookup() {
        let directory = Arc::new(MemoryDirectory::new().with_user("joe", ["reader"]));
        let cache = IdentityCache::new(
            Arc::clone(&directory) as Arc<dyn UserDirectory>,
            Arc::new(MemoryDefaultTarget::new("neo4j")),
            CachePolicy {
                role_ttl: Duration::from_millis(50),
                ..policy(false)
            },
        );

        cache.resolve_identity("joe").expect("resolve");
        cache.resolve_identity("joe").expect("resolve");
        assert_eq!(directory.lookup_count(), 1);

        std::thread::sleep(Duration::from_millis(120));
        cache.resolve_identity("joe").expect("resolve");
        assert_eq!(directory.lookup_count(), 2);
    }
}
