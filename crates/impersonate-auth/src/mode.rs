//! Folded per-target access modes.
//!
//! [`AccessModeBuilder`] folds privileges one by one; [`AccessMode`] is the
//! immutable result handed to a session host. The fold is order-independent:
//! grants and denies are accumulated separately and combined only when a
//! question is asked, so a deny always overrides a grant no matter which
//! was seen first.

use crate::{Action, Actions, Privilege, PropertyScope, Sign};
use std::collections::BTreeSet;

/// Accumulates privileges for one target.
///
/// # Example
///
/// ```
/// use impersonate_auth::{AccessModeBuilder, Action, Privilege, PropertyScope, TargetScope};
///
/// let mut builder = AccessModeBuilder::new("neo4j", ["restricted"]);
/// builder.add_privilege(&Privilege::grant(TargetScope::All, Action::Access));
/// builder.add_privilege(&Privilege::grant(TargetScope::All, Action::Read(PropertyScope::All)));
/// builder.add_privilege(&Privilege::deny(
///     TargetScope::All,
///     Action::Read(PropertyScope::Property("salary".into())),
/// ));
///
/// let mode = builder.build();
/// assert!(mode.allows_access());
/// assert!(mode.allows_read_property("name"));
/// assert!(!mode.allows_read_property("salary"));
/// ```
#[derive(Debug, Clone)]
pub struct AccessModeBuilder {
    target: String,
    roles: BTreeSet<String>,
    granted: Actions,
    denied: Actions,
    readable: BTreeSet<String>,
    unreadable: BTreeSet<String>,
    forced_access: bool,
}

impl AccessModeBuilder {
    #[must_use]
    pub fn new<I, S>(target: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            granted: Actions::empty(),
            denied: Actions::empty(),
            readable: BTreeSet::new(),
            unreadable: BTreeSet::new(),
            forced_access: false,
        }
    }

    /// Folds one privilege into the mode under construction.
    ///
    /// Scope matching is the caller's job; this only records the action.
    pub fn add_privilege(&mut self, privilege: &Privilege) -> &mut Self {
        match (&privilege.action, privilege.sign) {
            (Action::Read(PropertyScope::Property(key)), Sign::Grant) => {
                self.readable.insert(key.clone());
            }
            (Action::Read(PropertyScope::Property(key)), Sign::Deny) => {
                self.unreadable.insert(key.clone());
            }
            (action, Sign::Grant) => self.granted |= action.flag(),
            (action, Sign::Deny) => self.denied |= action.flag(),
        }
        self
    }

    /// Grants access unconditionally (system-management target).
    pub fn with_access(&mut self) -> &mut Self {
        self.forced_access = true;
        self
    }

    #[must_use]
    pub fn build(&self) -> AccessMode {
        AccessMode {
            target: self.target.clone(),
            roles: self.roles.clone(),
            granted: self.granted,
            denied: self.denied,
            readable: self.readable.clone(),
            unreadable: self.unreadable.clone(),
            forced_access: self.forced_access,
        }
    }
}

/// Effective rights of one identity on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMode {
    target: String,
    roles: BTreeSet<String>,
    granted: Actions,
    denied: Actions,
    readable: BTreeSet<String>,
    unreadable: BTreeSet<String>,
    forced_access: bool,
}

impl AccessMode {
    /// Full rights on `target`, used for callers' own sessions.
    #[must_use]
    pub fn unrestricted(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            roles: BTreeSet::new(),
            granted: Actions::ALL,
            denied: Actions::empty(),
            readable: BTreeSet::new(),
            unreadable: BTreeSet::new(),
            forced_access: false,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Target-wide actions after deny-overrides-grant.
    #[must_use]
    pub fn effective(&self) -> Actions {
        Actions::effective(self.granted, self.denied)
    }

    #[must_use]
    pub fn allows_access(&self) -> bool {
        self.forced_access || self.effective().contains(Actions::ACCESS)
    }

    #[must_use]
    pub fn allows_traverse(&self) -> bool {
        self.effective().contains(Actions::TRAVERSE)
    }

    #[must_use]
    pub fn allows_write(&self) -> bool {
        self.effective().contains(Actions::WRITE)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.effective().contains(Actions::ADMIN)
    }

    /// Returns `true` if property `key` may be read on traversed entities.
    ///
    /// A deny on the key, or on all properties, wins over any grant.
    #[must_use]
    pub fn allows_read_property(&self, key: &str) -> bool {
        let granted = self.granted.contains(Actions::READ) || self.readable.contains(key);
        let denied = self.denied.contains(Actions::READ) || self.unreadable.contains(key);
        granted && !denied
    }
}
