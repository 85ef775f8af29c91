//! Session lifecycle supervision.
//!
//! Ties each inner (impersonated) session to the caller's outer session.
//! The supervisor is the only actor that moves a binding out of OPEN:
//!
//! | State | Meaning | Next |
//! |-------|---------|------|
//! | OPEN | registered, outer still open | CLOSING once a sweep sees the outer closed |
//! | CLOSING | removed from the registry, terminal action running | CLOSED |
//! | CLOSED | inner committed or rolled back, then closed | (dropped) |

mod registry;
mod sweeper;

pub use registry::{Binding, BindingRegistry, SweepReport};
pub use sweeper::{SessionSupervisor, MIN_SWEEP_INTERVAL};
