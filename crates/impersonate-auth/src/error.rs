//! Authorization and authority errors.

use impersonate_types::ErrorCode;
use thiserror::Error;

/// The folded access mode does not allow access to the target.
///
/// # Example
///
/// ```
/// use impersonate_auth::AccessDenied;
///
/// let err = AccessDenied::new("joe", ["restricted", "analyst"], "neo4j");
/// assert_eq!(
///     err.to_string(),
///     "Target access is not allowed for user 'joe' with roles [analyst, restricted]."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Target access is not allowed for user '{username}' with roles [{}].", roles.join(", "))]
pub struct AccessDenied {
    pub username: String,
    /// Sorted role names.
    pub roles: Vec<String>,
    pub target: String,
}

impl AccessDenied {
    #[must_use]
    pub fn new<I, S>(username: impl Into<String>, roles: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        roles.sort();
        roles.dedup();
        Self {
            username: username.into(),
            roles,
            target: target.into(),
        }
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        "ACCESS_DENIED"
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Failure reported by a [`UserDirectory`](crate::UserDirectory) or
/// [`DefaultTargetProvider`](crate::DefaultTargetProvider).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("invalid user: {username}")]
    UnknownIdentity { username: String },

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl ErrorCode for DirectoryError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownIdentity { .. } => "UNKNOWN_IDENTITY",
            Self::Unavailable(_) => "DIRECTORY_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Failure reported by a [`PrivilegeStore`](crate::PrivilegeStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivilegeStoreError {
    #[error("privilege store unavailable: {0}")]
    Unavailable(String),
}

impl ErrorCode for PrivilegeStoreError {
    fn code(&self) -> &'static str {
        "PRIVILEGE_STORE_UNAVAILABLE"
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
