//! Session host traits.
//!
//! The query engine and its transactions live outside this crate. Hosts
//! expose them through [`Session`] and [`SessionFactory`]; the authority
//! collaborators come from `impersonate-auth`. [`Host`] bundles one of each
//! so an [`Impersonator`](crate::Impersonator) can be wired in one call.
//!
//! ```text
//! Session / SessionFactory (THIS MODULE)   ← trait definitions
//!          │
//!          └── MemorySession / MemorySessionFactory (memory::session)
//! ```

use impersonate_auth::{AccessDecision, DefaultTargetProvider, PrivilegeStore, UserDirectory};
use impersonate_types::{ErrorCode, Params, Row, SessionId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lazily produced query results.
pub type RowStream = Box<dyn Iterator<Item = Result<Row, SessionError>> + Send>;

/// Why a session ended without being committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// Killed by an operator or the host.
    Terminated,
    TimedOut,
    /// The client connection went away.
    ConnectionClosed,
    Failed(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated => write!(f, "terminated"),
            Self::TimedOut => write!(f, "timed out"),
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Session-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session {0} is closed")]
    Closed(SessionId),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("session backend failure: {0}")]
    Backend(String),
}

impl ErrorCode for SessionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Closed(_) => "SESSION_CLOSED",
            Self::InvalidQuery(_) => "QUERY_INVALID",
            Self::AccessDenied(_) => "SESSION_ACCESS_DENIED",
            Self::Backend(_) => "SESSION_BACKEND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// A transactional execution context.
///
/// Implementations are shared between the caller and the supervisor's
/// background sweep, so every method takes `&self`.
pub trait Session: Send + Sync + fmt::Debug {
    fn id(&self) -> SessionId;

    /// Name of the target this session runs against.
    fn target(&self) -> &str;

    /// Returns `false` once the session was committed, rolled back,
    /// terminated or closed.
    fn is_open(&self) -> bool;

    /// Set when the session was terminated rather than completed.
    fn termination_reason(&self) -> Option<TerminationReason>;

    /// # Errors
    ///
    /// Implementation-defined; typically [`SessionError::Closed`].
    fn commit(&self) -> Result<(), SessionError>;

    /// # Errors
    ///
    /// Implementation-defined; typically [`SessionError::Closed`].
    fn rollback(&self) -> Result<(), SessionError>;

    /// Releases the session. Called exactly once per inner session.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn close(&self) -> Result<(), SessionError>;

    /// Runs `query` and returns its rows lazily.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidQuery`] for unsupported queries,
    /// [`SessionError::Closed`] if the session is no longer open.
    fn execute(&self, query: &str, params: &Params) -> Result<RowStream, SessionError>;
}

/// Opens sessions under a given access decision.
pub trait SessionFactory: Send + Sync + fmt::Debug {
    /// # Errors
    ///
    /// [`SessionError`] if the backend cannot open a session.
    fn open_session(
        &self,
        decision: &AccessDecision,
        target: &str,
    ) -> Result<Arc<dyn Session>, SessionError>;
}

/// The collaborators an impersonator needs.
#[derive(Debug, Clone)]
pub struct Host {
    pub directory: Arc<dyn UserDirectory>,
    pub default_target: Arc<dyn DefaultTargetProvider>,
    pub privileges: Arc<dyn PrivilegeStore>,
    pub sessions: Arc<dyn SessionFactory>,
}
