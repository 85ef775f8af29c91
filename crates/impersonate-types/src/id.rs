//! Identifier types.
//!
//! - [`SessionId`]: UUID-based identity of an execution context (outer or inner)
//! - [`BindingId`]: stable handle the supervisor registry assigns at registration
//! - [`NodeId`]: stable identity of a graph entity, valid across sessions

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one execution context.
///
/// Entity values carry the id of the session whose object space they
/// belong to; re-binding a value moves it into another session's space
/// without changing the entity's [`NodeId`].
///
/// # Example
///
/// ```
/// use impersonate_types::SessionId;
///
/// let outer = SessionId::new();
/// let inner = SessionId::new();
/// assert_ne!(outer, inner);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

// No Default: an id that was never handed out by a session host is a bug.
#[allow(clippy::new_without_default)]
impl SessionId {
    /// Creates a new [`SessionId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Registry handle of one (outer, inner) session binding.
///
/// Handles are assigned from a monotonically increasing counter and are
/// never reused within a registry.
///
/// ```
/// use impersonate_types::BindingId;
///
/// assert_eq!(BindingId(7).to_string(), "binding:7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingId(pub u64);

impl BindingId {
    /// Returns the raw handle value.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding:{}", self.0)
    }
}

/// Stable identity of a graph entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}
