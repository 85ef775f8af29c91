//! Impersonated query execution runtime.
//!
//! # Architecture
//!
//! ```text
//!            caller (outer session)
//!                    │ impersonate(outer, username, query, params)
//!                    ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ Impersonator                                             │
//! │   ├── IdentityCache ──► UserDirectory / DefaultTarget    │
//! │   ├── PrivilegeStore + impersonate_auth::authorize       │
//! │   ├── SessionFactory::open_session ──► inner session     │
//! │   └── SessionSupervisor::register(outer, inner)          │
//! └──────────────────────────────────────────────────────────┘
//!                    │                       │
//!                    ▼                       ▼
//!            ImpersonatedRows        SessionSupervisor task
//!            (lazy, re-bound)        sweep every interval:
//!                                    outer closed → commit/rollback
//!                                    inner, then close it
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`cache`] | [`IdentityCache`]: single-flight TTL caches |
//! | [`supervisor`] | [`BindingRegistry`], [`SessionSupervisor`] |
//! | [`orchestrator`] | [`Impersonator`], [`ImpersonatedRows`] |
//! | [`host`] | [`Session`], [`SessionFactory`], [`Host`] |
//! | [`config`] | [`ImpersonateConfig`], [`ConfigLoader`] |
//! | [`memory`] | In-memory reference host |

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod memory;
pub mod orchestrator;
pub mod supervisor;

pub use cache::{CachePolicy, CacheStats, IdentityCache};
pub use config::{CacheConfig, ConfigError, ConfigLoader, ImpersonateConfig, SupervisorConfig};
pub use error::{ImpersonationError, SupervisorActionFailure, TerminalAction};
pub use host::{Host, RowStream, Session, SessionError, SessionFactory, TerminationReason};
pub use orchestrator::{ImpersonatedRows, Impersonator};
pub use supervisor::{Binding, BindingRegistry, SessionSupervisor, SweepReport};
