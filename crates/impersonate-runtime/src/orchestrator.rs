//! Impersonated query execution.
//!
//! # Flow
//!
//! ```text
//! impersonate(outer, username, query, params)
//!   1. IdentityCache::resolve_identity(username)     UnknownIdentity / SuspendedIdentity
//!   2. IdentityCache::resolve_default_target()
//!   3. PrivilegeStore::privileges_for(roles)
//!   4. authorize(.., target = outer.target())        AccessDenied
//!   5. SessionFactory::open_session(decision)        ← first side effect
//!   6. SessionSupervisor::register(outer, inner)
//!   7. inner.execute(query, params) ──► ImpersonatedRows (lazy, re-bound)
//! ```
//!
//! Steps 1–4 have no side effects, so a failure there leaves nothing to
//! clean up. From step 6 on the inner session belongs to the supervisor:
//! it is committed or rolled back when the outer session ends, whether or
//! not the rows are ever consumed.

use crate::cache::{CachePolicy, IdentityCache};
use crate::config::ImpersonateConfig;
use crate::error::ImpersonationError;
use crate::host::{Host, RowStream, Session, SessionError, SessionFactory};
use crate::supervisor::SessionSupervisor;
use impersonate_auth::{authorize, AuthorizationRequest, PrivilegeStore};
use impersonate_types::{BindingId, Params, Row, SessionId};
use std::sync::Arc;
use tracing::debug;

/// Runs queries as other identities.
#[derive(Debug)]
pub struct Impersonator {
    cache: IdentityCache,
    privileges: Arc<dyn PrivilegeStore>,
    sessions: Arc<dyn SessionFactory>,
    supervisor: Arc<SessionSupervisor>,
    system_target: Option<String>,
    rebind_entities: bool,
}

impl Impersonator {
    #[must_use]
    pub fn new(host: Host, supervisor: Arc<SessionSupervisor>, config: &ImpersonateConfig) -> Self {
        Self {
            cache: IdentityCache::new(
                host.directory,
                host.default_target,
                CachePolicy::from(&config.cache),
            ),
            privileges: host.privileges,
            sessions: host.sessions,
            supervisor,
            system_target: config.system_target().map(str::to_string),
            rebind_entities: config.rebind_entities,
        }
    }

    /// Identity cache, for maintenance such as invalidation after role
    /// changes.
    #[must_use]
    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    #[must_use]
    pub fn supervisor(&self) -> &Arc<SessionSupervisor> {
        &self.supervisor
    }

    /// Executes `query` as `username` inside the lifetime of `outer`.
    ///
    /// # Errors
    ///
    /// - [`ImpersonationError::UnknownIdentity`] / [`ImpersonationError::SuspendedIdentity`]
    /// - [`ImpersonationError::AccessDenied`] if the identity may not access the target
    /// - [`ImpersonationError::CacheComputation`] / [`ImpersonationError::PrivilegeLookup`]
    ///   if an authority failed
    /// - [`ImpersonationError::Session`] if the inner session could not be
    ///   opened or rejected the query
    pub fn impersonate(
        &self,
        outer: &Arc<dyn Session>,
        username: &str,
        query: &str,
        params: &Params,
    ) -> Result<ImpersonatedRows, ImpersonationError> {
        let identity = self.cache.resolve_identity(username)?;
        let default_target = self.cache.resolve_default_target()?;
        let privileges = self.privileges.privileges_for(identity.roles())?;
        let target = outer.target();

        let decision = authorize(&AuthorizationRequest {
            identity: &identity,
            privileges: &privileges,
            target,
            default_target: &default_target,
            system_target: self.system_target.as_deref(),
        })?;

        let inner = self.sessions.open_session(&decision, target)?;
        let binding = self.supervisor.register(Arc::clone(outer), Arc::clone(&inner));
        debug!(
            %binding,
            username,
            target_name = target,
            outer = %outer.id(),
            inner = %inner.id(),
            "opened impersonated session"
        );

        let rows = inner.execute(query, params)?;
        Ok(ImpersonatedRows {
            rows,
            binding,
            inner: inner.id(),
            rebind_into: self.rebind_entities.then(|| outer.id()),
        })
    }
}

/// Lazily produced rows of an impersonated query.
///
/// Dropping the iterator early leaves the inner session to the supervisor.
pub struct ImpersonatedRows {
    rows: RowStream,
    binding: BindingId,
    inner: SessionId,
    rebind_into: Option<SessionId>,
}

impl std::fmt::Debug for ImpersonatedRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpersonatedRows")
            .field("binding", &self.binding)
            .field("inner", &self.inner)
            .field("rebind_into", &self.rebind_into)
            .finish_non_exhaustive()
    }
}

impl ImpersonatedRows {
    #[must_use]
    pub fn binding(&self) -> BindingId {
        self.binding
    }

    /// Id of the impersonated session producing the rows.
    #[must_use]
    pub fn inner_session(&self) -> SessionId {
        self.inner
    }
}

impl Iterator for ImpersonatedRows {
    type Item = Result<Row, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.map(|row| match self.rebind_into {
            Some(session) => row
                .into_iter()
                .map(|(column, value)| (column, value.rebind(session)))
                .collect(),
            None => row,
        }))
    }
}
