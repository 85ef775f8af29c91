//! Coarse action flags.
//!
//! [`Actions`] records which whole-target actions a set of privileges
//! grants or denies. Property-level reads are tracked separately by
//! [`AccessMode`](crate::AccessMode); this type only carries the
//! target-wide bits.
//!
//! # Deny Wins
//!
//! ```text
//! effective = granted - denied
//! ```
//!
//! ```
//! use impersonate_auth::Actions;
//!
//! let granted = Actions::ACCESS | Actions::TRAVERSE | Actions::READ;
//! let denied = Actions::READ;
//! assert_eq!(Actions::effective(granted, denied), Actions::ACCESS | Actions::TRAVERSE);
//! ```

use bitflags::bitflags;

bitflags! {
    /// Target-wide actions a session may perform.
    ///
    /// | Flag | Meaning |
    /// |------|---------|
    /// | [`ACCESS`](Self::ACCESS) | open a session against the target at all |
    /// | [`TRAVERSE`](Self::TRAVERSE) | find entities (labels, identities) |
    /// | [`READ`](Self::READ) | read every property of found entities |
    /// | [`WRITE`](Self::WRITE) | create, update or delete entities |
    /// | [`ADMIN`](Self::ADMIN) | administrative operations |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Actions: u8 {
        const ACCESS   = 0b0000_0001;
        const TRAVERSE = 0b0000_0010;
        const READ     = 0b0000_0100;
        const WRITE    = 0b0000_1000;
        const ADMIN    = 0b0001_0000;
    }
}

impl Actions {
    /// What a built-in `reader` role is granted.
    pub const READER: Self = Self::ACCESS.union(Self::TRAVERSE).union(Self::READ);

    /// Every action.
    pub const ALL: Self = Self::READER.union(Self::WRITE).union(Self::ADMIN);

    /// Applies deny-overrides-grant.
    #[must_use]
    pub fn effective(granted: Self, denied: Self) -> Self {
        granted - denied
    }

    /// Returns a human-readable list of flag names.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::ACCESS) {
            names.push("ACCESS");
        }
        if self.contains(Self::TRAVERSE) {
            names.push("TRAVERSE");
        }
        if self.contains(Self::READ) {
            names.push("READ");
        }
        if self.contains(Self::WRITE) {
            names.push("WRITE");
        }
        if self.contains(Self::ADMIN) {
            names.push("ADMIN");
        }
        names
    }
}

impl std::fmt::Display for Actions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_is_access_traverse_read() {
        assert!(Actions::READER.contains(Actions::ACCESS));
        assert!(Actions::READER.contains(Actions::TRAVERSE));
        assert!(Actions::READER.contains(Actions::READ));
        assert!(!Actions::READER.contains(Actions::WRITE));
        assert!(!Actions::READER.contains(Actions::ADMIN));
    }

    #[test]
    fn deny_removes_granted_bits() {
        let effective = Actions::effective(Actions::ALL, Actions::WRITE | Actions::ADMIN);
        assert_eq!(effective, Actions::READER);
    }

    #[test]
    fn deny_without_grant_is_empty() {
        assert_eq!(
            Actions::effective(Actions::empty(), Actions::READ),
            Actions::empty()
        );
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Actions::READ.to_string(), "READ");
        assert_eq!(
            (Actions::ACCESS | Actions::WRITE).to_string(),
            "ACCESS | WRITE"
        );
        assert_eq!(Actions::empty().to_string(), "(none)");
    }
}
