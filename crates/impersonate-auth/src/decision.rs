//! Access decisions for impersonated sessions.
//!
//! [`authorize`] is a pure fold: it performs no lookups and caches nothing.
//! Callers resolve the identity, the default target name and the
//! privileges beforehand and pass them in an [`AuthorizationRequest`].

use crate::{AccessDenied, AccessMode, AccessModeBuilder, Identity, ImpersonatedSubject, Privilege};
use std::collections::BTreeSet;

/// Conventional name of the system-management target.
pub const SYSTEM_TARGET: &str = "system";

/// Inputs of one authorization.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    pub identity: &'a Identity,
    /// Privileges attached to any of the identity's roles.
    pub privileges: &'a [Privilege],
    pub target: &'a str,
    pub default_target: &'a str,
    /// When set and equal to `target`, access is granted unconditionally.
    pub system_target: Option<&'a str>,
}

/// Result of a successful authorization.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    subject: ImpersonatedSubject,
    mode: AccessMode,
    is_admin: bool,
}

impl AccessDecision {
    /// Always `true`; denied requests never produce a decision.
    #[must_use]
    pub fn allowed(&self) -> bool {
        self.mode.allows_access()
    }

    #[must_use]
    pub fn subject(&self) -> &ImpersonatedSubject {
        &self.subject
    }

    #[must_use]
    pub fn mode(&self) -> &AccessMode {
        &self.mode
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        self.mode.roles()
    }

    #[must_use]
    pub fn target(&self) -> &str {
        self.mode.target()
    }
}

/// Folds the applicable privileges into an access decision for `target`.
///
/// A privilege applies when it names `target` (or all targets), or when
/// `target` is the default target and the privilege is scoped to the
/// default.
///
/// # Errors
///
/// [`AccessDenied`] with the identity name and sorted roles when the folded
/// mode does not allow access.
///
/// # Example
///
/// ```
/// use impersonate_auth::{authorize, Action, AuthorizationRequest, Identity, Privilege, TargetScope};
///
/// let joe = Identity::new("joe", ["reader"]);
/// let privileges = [Privilege::grant(TargetScope::Default, Action::Access)];
///
/// let ok = authorize(&AuthorizationRequest {
///     identity: &joe,
///     privileges: &privileges,
///     target: "neo4j",
///     default_target: "neo4j",
///     system_target: None,
/// });
/// assert!(ok.is_ok());
///
/// let denied = authorize(&AuthorizationRequest {
///     identity: &joe,
///     privileges: &privileges,
///     target: "sales",
///     default_target: "neo4j",
///     system_target: None,
/// });
/// assert!(denied.is_err());
/// ```
pub fn authorize(request: &AuthorizationRequest<'_>) -> Result<AccessDecision, AccessDenied> {
    let identity = request.identity;
    let is_default = request.target == request.default_target;

    let mut builder = AccessModeBuilder::new(request.target, identity.roles().iter().cloned());
    for privilege in request.privileges {
        if privilege.applies_to(request.target) || (is_default && privilege.applies_to_default()) {
            builder.add_privilege(privilege);
        }
    }
    if request.system_target == Some(request.target) {
        builder.with_access();
    }

    let mode = builder.build();
    if !mode.allows_access() {
        return Err(AccessDenied::new(
            identity.username(),
            identity.sorted_roles(),
            request.target,
        ));
    }

    Ok(AccessDecision {
        subject: ImpersonatedSubject::new(identity.username()),
        is_admin: mode.is_admin(),
        mode,
    })
}
