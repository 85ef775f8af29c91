//! Binding registry.
//!
//! An arena of `(outer, inner)` session pairs keyed by a [`BindingId`]
//! handed out at registration. Inserts and sweeps may run concurrently.
//!
//! # Sweep
//!
//! ```text
//! for each binding whose outer session is no longer open:
//!     remove(id)                     ── atomic; a racing sweep gets None
//!     outer.termination_reason()
//!         None        → inner.commit()
//!         Some(_)     → inner.rollback()
//!         panicked    → inner.rollback()
//!     inner.close()                  ── always, even if the action failed
//! ```
//!
//! A failing or panicking session only affects its own binding.

use crate::error::{SupervisorActionFailure, TerminalAction};
use crate::host::{Session, SessionError, TerminationReason};
use dashmap::DashMap;
use impersonate_types::BindingId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// One outer session paired with the inner session it owns.
#[derive(Debug, Clone)]
pub struct Binding {
    pub outer: Arc<dyn Session>,
    pub inner: Arc<dyn Session>,
}

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub committed: usize,
    pub rolled_back: usize,
    /// Bindings removed with at least one failed terminal action.
    pub failed: usize,
    /// Bindings left untouched because their outer session is open.
    pub still_open: usize,
}

impl SweepReport {
    /// Number of bindings this sweep removed.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.committed + self.rolled_back + self.failed
    }

    fn merge(&mut self, other: &Self) {
        self.committed += other.committed;
        self.rolled_back += other.rolled_back;
        self.failed += other.failed;
    }
}

/// Concurrent registry of live bindings.
///
/// # Example
///
/// ```
/// use impersonate_runtime::memory::{MemoryGraph, MemorySessionFactory};
/// use impersonate_runtime::supervisor::BindingRegistry;
/// use impersonate_runtime::Session;
/// use std::sync::Arc;
///
/// let factory = MemorySessionFactory::new(Arc::new(MemoryGraph::new()));
/// let outer = factory.open_caller_session("neo4j");
/// let inner = factory.open_caller_session("neo4j");
///
/// let registry = BindingRegistry::new();
/// registry.register(outer.clone(), inner.clone());
///
/// assert_eq!(registry.sweep().still_open, 1);
/// outer.commit().unwrap();
/// assert_eq!(registry.sweep().committed, 1);
/// assert!(registry.is_empty());
/// assert_eq!(inner.commit_count(), 1);
/// assert_eq!(inner.close_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: DashMap<BindingId, Binding>,
    next_id: AtomicU64,
}

impl BindingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding and returns its handle.
    pub fn register(&self, outer: Arc<dyn Session>, inner: Arc<dyn Session>) -> BindingId {
        let id = BindingId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        debug!(
            binding = %id,
            outer = %outer.id(),
            inner = %inner.id(),
            "registered impersonation binding"
        );
        self.bindings.insert(id, Binding { outer, inner });
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: BindingId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Finalizes every binding whose outer session has closed.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut closed = Vec::new();

        for entry in self.bindings.iter() {
            match shielded(|| entry.value().outer.is_open()) {
                Ok(true) => report.still_open += 1,
                Ok(false) => closed.push(*entry.key()),
                Err(message) => {
                    error!(binding = %entry.key(), error = %message, "outer session state check failed");
                    closed.push(*entry.key());
                }
            }
        }

        for id in closed {
            let Some((id, binding)) = self.bindings.remove(&id) else {
                continue;
            };
            report.merge(&finalize(id, &binding));
        }

        report
    }
}

fn finalize(id: BindingId, binding: &Binding) -> SweepReport {
    let mut report = SweepReport::default();

    // An outer session that cannot report its state counts as failed.
    let reason = shielded(|| binding.outer.termination_reason())
        .unwrap_or_else(|message| Some(TerminationReason::Failed(message)));

    let (action, result) = match reason {
        None => (TerminalAction::Commit, guarded(|| binding.inner.commit())),
        Some(reason) => {
            debug!(binding = %id, %reason, "outer session terminated, rolling back");
            (TerminalAction::Rollback, guarded(|| binding.inner.rollback()))
        }
    };
    let mut ok = report_failure(id, action, result);

    let closed = guarded(|| binding.inner.close());
    ok &= report_failure(id, TerminalAction::Close, closed);

    match (ok, action) {
        (false, _) => report.failed = 1,
        (true, TerminalAction::Commit) => report.committed = 1,
        (true, _) => report.rolled_back = 1,
    }
    report
}

/// Runs a session call, turning a panic into an error.
fn shielded<T>(call: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(call)).map_err(|_| "session panicked".to_string())
}

fn guarded(call: impl FnOnce() -> Result<(), SessionError>) -> Result<(), String> {
    shielded(call)?.map_err(|e| e.to_string())
}

fn report_failure(id: BindingId, action: TerminalAction, result: Result<(), String>) -> bool {
    match result {
        Ok(()) => true,
        Err(message) => {
            let failure = SupervisorActionFailure {
                binding: id,
                action,
                message,
            };
            error!(binding = %id, %action, error = %failure, "impersonation binding action failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RowStream;
    use impersonate_types::{Params, SessionId};
    use parking_lot::Mutex;

    /// Session double that records calls and can be told to fail.
    #[derive(Debug)]
    struct Recording {
        id: SessionId,
        open: Mutex<bool>,
        reason: Option<TerminationReason>,
        fail_commit: bool,
        panic_on_close: bool,
        panic_on_state: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                id: SessionId::new(),
                open: Mutex::new(true),
                reason: None,
                fail_commit: false,
                panic_on_close: false,
                panic_on_state: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn closed_with(reason: Option<TerminationReason>) -> Self {
            let session = Self {
                reason,
                ..Self::new()
            };
            *session.open.lock() = false;
            session
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }
    }

    impl Session for Recording {
        fn id(&self) -> SessionId {
            self.id
        }

        fn target(&self) -> &str {
            "neo4j"
        }

        fn is_open(&self) -> bool {
            if self.panic_on_state {
                panic!("state lost");
            }
            *self.open.lock()
        }

        fn termination_reason(&self) -> Option<TerminationReason> {
            if self.panic_on_state {
                panic!("state lost");
            }
            self.reason.clone()
        }

        fn commit(&self) -> Result<(), SessionError> {
            self.calls.lock().push("commit");
            if self.fail_commit {
                return Err(SessionError::Backend("disk full".into()));
            }
            Ok(())
        }

        fn rollback(&self) -> Result<(), SessionError> {
            self.calls.lock().push("rollback");
            Ok(())
        }

        fn close(&self) -> Result<(), SessionError> {
            self.calls.lock().push("close");
            if self.panic_on_close {
                panic!("close exploded");
            }
            Ok(())
        }

        fn execute(&self, _query: &str, _params: &Params) -> Result<RowStream, SessionError> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    #[test]
    fn open_outer_is_untouched() {
        let registry = BindingRegistry::new();
        let inner = Arc::new(Recording::new());
        let id = registry.register(Arc::new(Recording::new()), inner.clone());

        let report = registry.sweep();
        assert_eq!(report.still_open, 1);
        assert_eq!(report.removed(), 0);
        assert!(registry.contains(id));
        assert!(inner.calls().is_empty());
    }

    #[test]
    fn committed_outer_commits_then_closes_inner() {
        let registry = BindingRegistry::new();
        let inner = Arc::new(Recording::new());
        registry.register(Arc::new(Recording::closed_with(None)), inner.clone());

        let report = registry.sweep();
        assert_eq!(report.committed, 1);
        assert!(registry.is_empty());
        assert_eq!(inner.calls(), vec!["commit", "close"]);
    }

    #[test]
    fn terminated_outer_rolls_back_then_closes_inner() {
        let registry = BindingRegistry::new();
        let inner = Arc::new(Recording::new());
        registry.register(
            Arc::new(Recording::closed_with(Some(TerminationReason::Terminated))),
            inner.clone(),
        );

        let report = registry.sweep();
        assert_eq!(report.rolled_back, 1);
        assert_eq!(inner.calls(), vec!["rollback", "close"]);
    }

    #[test]
    fn failures_are_isolated_per_binding() {
        let registry = BindingRegistry::new();

        let failing = Arc::new(Recording {
            fail_commit: true,
            ..Recording::new()
        });
        let panicking = Arc::new(Recording {
            panic_on_close: true,
            ..Recording::new()
        });
        let healthy = Arc::new(Recording::new());

        registry.register(Arc::new(Recording::closed_with(None)), failing.clone());
        registry.register(Arc::new(Recording::closed_with(None)), panicking.clone());
        registry.register(Arc::new(Recording::closed_with(None)), healthy.clone());

        let report = registry.sweep();
        assert_eq!(report.failed, 2);
        assert_eq!(report.committed, 1);
        assert!(registry.is_empty());

        // Close still runs after a failed commit.
        assert_eq!(failing.calls(), vec!["commit", "close"]);
        assert_eq!(healthy.calls(), vec!["commit", "close"]);
    }

    #[test]
    fn panicking_outer_rolls_back_without_starving_others() {
        let registry = BindingRegistry::new();

        let broken_outer = Arc::new(Recording {
            panic_on_state: true,
            ..Recording::new()
        });
        let orphan = Arc::new(Recording::new());
        let healthy = Arc::new(Recording::new());

        registry.register(broken_outer, orphan.clone());
        registry.register(Arc::new(Recording::closed_with(None)), healthy.clone());

        let report = registry.sweep();
        assert_eq!(report.rolled_back, 1);
        assert_eq!(report.committed, 1);
        assert!(registry.is_empty());
        assert_eq!(orphan.calls(), vec!["rollback", "close"]);
        assert_eq!(healthy.calls(), vec!["commit", "close"]);
    }

    #[test]
    fn handles_are_unique() {
        let registry = BindingRegistry::new();
        let a = registry.register(Arc::new(Recording::new()), Arc::new(Recording::new()));
        let b = registry.register(Arc::new(Recording::new()), Arc::new(Recording::new()));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn racing_sweeps_act_once_per_binding() {
        let registry = Arc::new(BindingRegistry::new());
        let inners: Vec<Arc<Recording>> = (0..64).map(|_| Arc::new(Recording::new())).collect();
        for inner in &inners {
            registry.register(Arc::new(Recording::closed_with(None)), inner.clone());
        }

        let barrier = Arc::new(std::sync::Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.sweep()
                })
            })
            .collect();

        let total: usize = handles
            .into_iter()
            .map(|h| h.join().expect("sweep thread").committed)
            .sum();

        assert_eq!(total, 64);
        for inner in &inners {
            assert_eq!(inner.calls(), vec!["commit", "close"]);
        }
    }
}
