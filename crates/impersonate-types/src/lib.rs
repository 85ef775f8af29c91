//! Core types for the impersonation workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! impersonate-types    (ids, values, ErrorCode)   ◄── THIS CRATE
//!        ↑
//! impersonate-auth     (Identity, Privilege, AccessMode, authorize)
//!        ↑
//! impersonate-runtime  (IdentityCache, SessionSupervisor, Impersonator)
//!        ↑
//! impersonate-cli      (binary)
//! ```
//!
//! Nothing in this crate knows about authorization or sessions; it only
//! defines the vocabulary the other layers exchange.

pub mod error;
pub mod id;
pub mod value;

pub use error::{assert_error_code, ErrorCode};
pub use id::{BindingId, NodeId, SessionId};
pub use value::{Node, Params, Row, Value};
