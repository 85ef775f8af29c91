//! Resolved identities.

use std::collections::BTreeSet;

/// A named identity and its current role set.
///
/// Identities are resolved from a [`UserDirectory`](crate::UserDirectory)
/// and never persisted. Roles are kept sorted so that messages and logs
/// list them deterministically.
///
/// # Example
///
/// ```
/// use impersonate_auth::Identity;
///
/// let joe = Identity::new("joe", ["restricted", "analyst"]);
/// assert!(joe.has_role("restricted"));
/// assert_eq!(joe.sorted_roles(), vec!["analyst", "restricted"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    roles: BTreeSet<String>,
    suspended: bool,
}

impl Identity {
    /// Creates an active (non-suspended) identity.
    #[must_use]
    pub fn new<I, S>(username: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            suspended: false,
        }
    }

    #[must_use]
    pub fn suspended(mut self, suspended: bool) -> Self {
        self.suspended = suspended;
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Role names in ascending order.
    #[must_use]
    pub fn sorted_roles(&self) -> Vec<String> {
        self.roles.iter().cloned().collect()
    }
}
