//! Permission primitives for impersonated execution.
//!
//! # Decision Model
//!
//! ```text
//! Identity(WHO: username + roles)
//!     │
//!     ├── PrivilegeStore::privileges_for(roles) ──► [Privilege]
//!     │                                               │ fold: applies_to(target)
//!     │                                               │    or default && applies_to_default()
//!     ▼                                               ▼
//! authorize(AuthorizationRequest) ─────────────────────────► AccessDecision
//!                                                               ├── ImpersonatedSubject
//!                                                               └── AccessMode (deny wins)
//! ```
//!
//! | Type | Role |
//! |------|------|
//! | [`Identity`] | Who is being impersonated, with the role set cached upstream |
//! | [`Privilege`] | `(scope, action, sign)` attached to a role |
//! | [`Actions`] | Bitflags of coarse actions (ACCESS, TRAVERSE, READ, WRITE, ADMIN) |
//! | [`AccessMode`] | Folded, per-target rights; deny always overrides grant |
//! | [`AccessDecision`] | Subject + mode handed to the session host |
//!
//! # Design Principles
//!
//! - **Trait definitions here, implementations in consumers**: the authority
//!   collaborators ([`UserDirectory`], [`PrivilegeStore`],
//!   [`DefaultTargetProvider`]) are declared here and implemented by hosts
//!   (the runtime crate ships in-memory versions).
//! - **Pure decisions**: [`authorize`] performs no I/O and caches nothing.
//! - **Deny wins**: a deny for a scope/action beats every grant the fold sees.

pub mod capability;
pub mod decision;
pub mod directory;
pub mod error;
pub mod identity;
pub mod mode;
pub mod privilege;
pub mod subject;

pub use capability::Actions;
pub use decision::{authorize, AccessDecision, AuthorizationRequest, SYSTEM_TARGET};
pub use directory::{DefaultTargetProvider, PrivilegeStore, UserDirectory, UserRecord};
pub use error::{AccessDenied, DirectoryError, PrivilegeStoreError};
pub use identity::Identity;
pub use mode::{AccessMode, AccessModeBuilder};
pub use privilege::{Action, Privilege, PropertyScope, Sign, TargetScope};
pub use subject::{AuthSubject, AuthenticationResult, ImpersonatedSubject};
