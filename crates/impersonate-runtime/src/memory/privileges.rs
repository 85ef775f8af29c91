//! In-memory privilege store.
//!
//! Starts with one built-in role:
//!
//! | Role | Privileges |
//! |------|------------|
//! | `reader` | GRANT ACCESS, TRAVERSE, READ {*} ON * |

use impersonate_auth::{Action, Privilege, PrivilegeStore, PrivilegeStoreError, PropertyScope, TargetScope};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

/// Name of the built-in read-only role.
pub const READER_ROLE: &str = "reader";

/// Role → privileges table.
///
/// # Example
///
/// ```
/// use impersonate_auth::{Action, Privilege, PrivilegeStore, PropertyScope, TargetScope};
/// use impersonate_runtime::memory::MemoryPrivilegeStore;
/// use std::collections::BTreeSet;
///
/// let store = MemoryPrivilegeStore::new();
/// store.copy_role("reader", "restricted").unwrap();
/// store.grant(
///     "restricted",
///     Privilege::deny(TargetScope::All, Action::Read(PropertyScope::Property("salary".into()))),
/// );
///
/// let roles = BTreeSet::from(["restricted".to_string()]);
/// assert_eq!(store.privileges_for(&roles).unwrap().len(), 4);
/// ```
#[derive(Debug)]
pub struct MemoryPrivilegeStore {
    roles: RwLock<HashMap<String, Vec<Privilege>>>,
}

impl Default for MemoryPrivilegeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPrivilegeStore {
    /// Creates a store holding the built-in `reader` role.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::empty();
        store.create_role(READER_ROLE);
        for action in [
            Action::Access,
            Action::Traverse,
            Action::Read(PropertyScope::All),
        ] {
            store.grant(READER_ROLE, Privilege::grant(TargetScope::All, action));
        }
        store
    }

    /// Creates a store without any roles.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }

    /// Creates `role` without privileges; existing roles are kept.
    pub fn create_role(&self, role: impl Into<String>) {
        self.roles.write().entry(role.into()).or_default();
    }

    /// Attaches a privilege to `role`, creating the role if needed.
    pub fn grant(&self, role: impl Into<String>, privilege: Privilege) {
        self.roles
            .write()
            .entry(role.into())
            .or_default()
            .push(privilege);
    }

    /// Creates `to` with a copy of `from`'s privileges.
    ///
    /// # Errors
    ///
    /// [`PrivilegeStoreError::Unavailable`] if `from` does not exist.
    pub fn copy_role(&self, from: &str, to: impl Into<String>) -> Result<(), PrivilegeStoreError> {
        let mut roles = self.roles.write();
        let privileges = roles
            .get(from)
            .cloned()
            .ok_or_else(|| PrivilegeStoreError::Unavailable(format!("no such role: {from}")))?;
        roles.insert(to.into(), privileges);
        Ok(())
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.read().contains_key(role)
    }
}

impl PrivilegeStore for MemoryPrivilegeStore {
    fn privileges_for(
        &self,
        roles: &BTreeSet<String>,
    ) -> Result<Vec<Privilege>, PrivilegeStoreError> {
        let table = self.roles.read();
        Ok(roles
            .iter()
            .filter_map(|role| table.get(role))
            .flatten()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reader_is_built_in() {
        let store = MemoryPrivilegeStore::new();
        assert!(store.has_role(READER_ROLE));
        let privileges = store.privileges_for(&roles(&["reader"])).expect("lookup");
        assert_eq!(privileges.len(), 3);
        assert!(privileges.iter().all(|p| !p.is_deny()));
    }

    #[test]
    fn unknown_roles_contribute_nothing() {
        let store = MemoryPrivilegeStore::new();
        let privileges = store.privileges_for(&roles(&["nobody"])).expect("lookup");
        assert!(privileges.is_empty());
    }

    #[test]
    fn copy_role_is_independent_of_source() {
        let store = MemoryPrivilegeStore::new();
        store.copy_role(READER_ROLE, "restricted").expect("copy");
        store.grant(
            "restricted",
            Privilege::deny(TargetScope::All, Action::Write),
        );
        assert_eq!(store.privileges_for(&roles(&["reader"])).expect("lookup").len(), 3);
        assert_eq!(
            store.privileges_for(&roles(&["restricted"])).expect("lookup").len(),
            4
        );
    }

    #[test]
    fn copy_of_missing_role_fails() {
        let store = MemoryPrivilegeStore::empty();
        assert!(store.copy_role("reader", "x").is_err());
        assert!(!store.has_role("x"));
    }
}
