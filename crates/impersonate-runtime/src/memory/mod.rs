//! In-memory reference host.
//!
//! Implements every collaborator trait against process-local state, for
//! tests and for the `impersonate` binary:
//!
//! | Trait | Implementation |
//! |-------|----------------|
//! | `UserDirectory` | [`MemoryDirectory`] |
//! | `DefaultTargetProvider` | [`MemoryDefaultTarget`] |
//! | `PrivilegeStore` | [`MemoryPrivilegeStore`] |
//! | `SessionFactory` / `Session` | [`MemorySessionFactory`] / [`MemorySession`] |
//!
//! [`HostFixture`] builds all of them from one JSON document.

mod directory;
mod fixture;
mod graph;
mod privileges;
mod query;
mod session;

pub use directory::{MemoryDefaultTarget, MemoryDirectory};
pub use fixture::{FixtureError, HostFixture, MemoryHost, NodeFixture, RoleFixture};
pub use graph::{MemoryGraph, StoredNode};
pub use privileges::{MemoryPrivilegeStore, READER_ROLE};
pub use query::{Filter, Projection, Query};
pub use session::{MemorySession, MemorySessionFactory, SessionState};
