//! Authority collaborator traits.
//!
//! Declared here, implemented by hosts:
//!
//! ```text
//! UserDirectory / PrivilegeStore / DefaultTargetProvider (impersonate-auth)  ← traits (THIS MODULE)
//!          │
//!          └── MemoryDirectory / MemoryPrivilegeStore / MemoryDefaultTarget (impersonate-runtime)
//! ```
//!
//! Implementations may block; callers reach them only on cache misses.

use crate::{DirectoryError, Privilege, PrivilegeStoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// What a directory knows about one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub suspended: bool,
}

/// Source of user records.
pub trait UserDirectory: Send + Sync + Debug {
    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::UnknownIdentity`] if no such user exists.
    fn lookup_user(&self, username: &str) -> Result<UserRecord, DirectoryError>;

    /// Returns the user's current suspension flag.
    ///
    /// Override when the authority can answer this more cheaply than a
    /// full lookup.
    ///
    /// # Errors
    ///
    /// Same as [`lookup_user`](Self::lookup_user).
    fn is_suspended(&self, username: &str) -> Result<bool, DirectoryError> {
        self.lookup_user(username).map(|record| record.suspended)
    }
}

/// Source of the current default target name.
pub trait DefaultTargetProvider: Send + Sync + Debug {
    /// # Errors
    ///
    /// [`DirectoryError::Unavailable`] if the name cannot be determined.
    fn current_default_target(&self) -> Result<String, DirectoryError>;
}

/// Source of the privileges attached to roles.
pub trait PrivilegeStore: Send + Sync + Debug {
    /// Returns every privilege attached to any of `roles`.
    ///
    /// # Errors
    ///
    /// [`PrivilegeStoreError::Unavailable`] if the store cannot be read.
    fn privileges_for(&self, roles: &BTreeSet<String>)
        -> Result<Vec<Privilege>, PrivilegeStoreError>;
}
