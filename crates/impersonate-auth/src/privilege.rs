//! Role privileges.
//!
//! A [`Privilege`] is `(scope, action, sign)`: *where* it applies, *what*
//! it controls, and whether it grants or denies. Privileges are owned by an
//! external store and are read-only here.
//!
//! # Scope Matching
//!
//! | Scope | `applies_to(t)` | `applies_to_default()` |
//! |-------|-----------------|------------------------|
//! | `All` | always | no |
//! | `Default` | never | yes |
//! | `Named(n)` | `n == t` | no |
//!
//! A `Default`-scoped privilege therefore only takes effect when the
//! target being authorized happens to be the current default target.
//!
//! # Serialized Form
//!
//! ```
//! use impersonate_auth::{Action, Privilege, PropertyScope, TargetScope};
//!
//! let json = r#"{"scope":"all","action":{"read":{"property":"salary"}},"sign":"deny"}"#;
//! let parsed: Privilege = serde_json::from_str(json).unwrap();
//! assert_eq!(
//!     parsed,
//!     Privilege::deny(TargetScope::All, Action::Read(PropertyScope::Property("salary".into())))
//! );
//! ```

use crate::Actions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which targets a privilege covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScope {
    /// Every target (`ON GRAPH *`).
    All,
    /// Whichever target is currently marked default.
    Default,
    /// One named target.
    Named(String),
}

impl TargetScope {
    /// Shorthand for [`TargetScope::Named`].
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for TargetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Default => write!(f, "DEFAULT"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Which properties a read privilege covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyScope {
    All,
    Property(String),
}

/// What a privilege controls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Access,
    Traverse,
    Read(PropertyScope),
    Write,
    Admin,
}

impl Action {
    /// Target-wide flag for this action.
    ///
    /// Property-scoped reads return an empty set; they are tracked per key.
    #[must_use]
    pub fn flag(&self) -> Actions {
        match self {
            Self::Access => Actions::ACCESS,
            Self::Traverse => Actions::TRAVERSE,
            Self::Read(PropertyScope::All) => Actions::READ,
            Self::Read(PropertyScope::Property(_)) => Actions::empty(),
            Self::Write => Actions::WRITE,
            Self::Admin => Actions::ADMIN,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "ACCESS"),
            Self::Traverse => write!(f, "TRAVERSE"),
            Self::Read(PropertyScope::All) => write!(f, "READ {{*}}"),
            Self::Read(PropertyScope::Property(key)) => write!(f, "READ {{{key}}}"),
            Self::Write => write!(f, "WRITE"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Grant,
    Deny,
}

/// One privilege attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Privilege {
    pub scope: TargetScope,
    pub action: Action,
    pub sign: Sign,
}

impl Privilege {
    #[must_use]
    pub fn grant(scope: TargetScope, action: Action) -> Self {
        Self {
            scope,
            action,
            sign: Sign::Grant,
        }
    }

    #[must_use]
    pub fn deny(scope: TargetScope, action: Action) -> Self {
        Self {
            scope,
            action,
            sign: Sign::Deny,
        }
    }

    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.sign == Sign::Deny
    }

    /// Returns `true` if this privilege covers `target` by name or wildcard.
    #[must_use]
    pub fn applies_to(&self, target: &str) -> bool {
        match &self.scope {
            TargetScope::All => true,
            TargetScope::Default => false,
            TargetScope::Named(name) => name == target,
        }
    }

    /// Returns `true` if this privilege covers the default target.
    #[must_use]
    pub fn applies_to_default(&self) -> bool {
        self.scope == TargetScope::Default
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Grant => "GRANT",
            Sign::Deny => "DENY",
        };
        write!(f, "{sign} {} ON {}", self.action, self.scope)
    }
}
