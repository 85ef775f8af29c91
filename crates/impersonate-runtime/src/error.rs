//! Impersonation errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ImpersonationError::UnknownIdentity`] | `UNKNOWN_IDENTITY` | No |
//! | [`ImpersonationError::SuspendedIdentity`] | `SUSPENDED_IDENTITY` | No |
//! | [`ImpersonationError::AccessDenied`] | `ACCESS_DENIED` | No |
//! | [`ImpersonationError::CacheComputation`] | `CACHE_COMPUTATION_FAILURE` | Yes |
//! | [`ImpersonationError::PrivilegeLookup`] | `PRIVILEGE_LOOKUP_FAILED` | Yes |
//! | [`ImpersonationError::Session`] | `SESSION_FAILURE` | depends on source |
//!
//! Every failure before execution begins aborts the call before an inner
//! session is opened. [`SupervisorActionFailure`] is never returned to
//! callers; the supervisor logs it and counts it in its sweep report.

use impersonate_auth::{AccessDenied, DirectoryError, PrivilegeStoreError};
use impersonate_types::{BindingId, ErrorCode};
use std::fmt;
use thiserror::Error;

use crate::host::SessionError;

/// Failure of one `impersonate` call.
///
/// `Clone` so that a cache computation failure can be handed to every
/// concurrent waiter.
///
/// # Example
///
/// ```
/// use impersonate_runtime::ImpersonationError;
/// use impersonate_types::ErrorCode;
///
/// let err = ImpersonationError::UnknownIdentity { username: "ghost".into() };
/// assert_eq!(err.to_string(), "invalid user: ghost");
/// assert_eq!(err.code(), "UNKNOWN_IDENTITY");
/// ```
#[derive(Debug, Clone, Error)]
pub enum ImpersonationError {
    #[error("invalid user: {username}")]
    UnknownIdentity { username: String },

    #[error("cannot impersonate a suspended account: {username}")]
    SuspendedIdentity { username: String },

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    /// The authority failed while a cache entry was being computed.
    #[error("failed to resolve '{key}': {source}")]
    CacheComputation {
        key: String,
        #[source]
        source: DirectoryError,
    },

    #[error("privilege lookup failed: {0}")]
    PrivilegeLookup(#[from] PrivilegeStoreError),

    #[error("impersonated session failed: {0}")]
    Session(#[from] SessionError),
}

impl ImpersonationError {
    /// Maps a directory failure for `key` onto the impersonation taxonomy.
    pub(crate) fn from_directory(key: &str, err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownIdentity { username } => Self::UnknownIdentity { username },
            other => Self::CacheComputation {
                key: key.to_string(),
                source: other,
            },
        }
    }
}

impl ErrorCode for ImpersonationError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownIdentity { .. } => "UNKNOWN_IDENTITY",
            Self::SuspendedIdentity { .. } => "SUSPENDED_IDENTITY",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::CacheComputation { .. } => "CACHE_COMPUTATION_FAILURE",
            Self::PrivilegeLookup(_) => "PRIVILEGE_LOOKUP_FAILED",
            Self::Session(_) => "SESSION_FAILURE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::UnknownIdentity { .. } | Self::SuspendedIdentity { .. } | Self::AccessDenied(_) => {
                false
            }
            Self::CacheComputation { .. } | Self::PrivilegeLookup(_) => true,
            Self::Session(e) => e.is_recoverable(),
        }
    }
}

/// Terminal action the supervisor applies to an inner session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalAction {
    Commit,
    Rollback,
    Close,
}

impl fmt::Display for TerminalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Rollback => write!(f, "rollback"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// A terminal action failed for one binding.
#[derive(Debug, Clone, Error)]
#[error("{action} failed for {binding}: {message}")]
pub struct SupervisorActionFailure {
    pub binding: BindingId,
    pub action: TerminalAction,
    pub message: String,
}

impl ErrorCode for SupervisorActionFailure {
    fn code(&self) -> &'static str {
        "SUPERVISOR_ACTION_FAILURE"
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
