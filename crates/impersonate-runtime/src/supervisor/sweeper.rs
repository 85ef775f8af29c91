//! Background sweeper task.
//!
//! The supervisor owns one Tokio task that ticks at a fixed rate, the first
//! tick one interval after start. Each tick runs
//! [`BindingRegistry::sweep`] on the blocking pool, since session
//! commit/rollback/close may block.
//!
//! ```text
//! start ──► [interval] ──► sweep ──► [interval] ──► sweep ──► ...
//!                                                         │
//! stop  ──► shutdown signal ──► final sweep ──► task exits ┘
//!           (bounded by drain timeout)
//! ```

use super::BindingRegistry;
use crate::config::SupervisorConfig;
use crate::host::Session;
use impersonate_types::BindingId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Shortest period the sweeper ticks at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

struct Worker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the binding registry and the task that sweeps it.
pub struct SessionSupervisor {
    registry: Arc<BindingRegistry>,
    drain_timeout: Duration,
    worker: Mutex<Option<Worker>>,
}

impl std::fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("pending", &self.registry.len())
            .field("drain_timeout", &self.drain_timeout)
            .field("running", &self.is_running())
            .finish()
    }
}

impl SessionSupervisor {
    /// Spawns the sweeper on the current Tokio runtime.
    ///
    /// A zero sweep interval is raised to [`MIN_SWEEP_INTERVAL`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(config: &SupervisorConfig) -> Self {
        let registry = Arc::new(BindingRegistry::new());
        let (shutdown, shutdown_rx) = oneshot::channel();
        let interval = config.sweep_interval().max(MIN_SWEEP_INTERVAL);
        if interval != config.sweep_interval() {
            warn!(
                requested_ms = config.sweep_interval_ms,
                "sweep interval too small, using the minimum"
            );
        }
        let handle = tokio::spawn(run(Arc::clone(&registry), interval, shutdown_rx));
        info!(
            interval_ms = interval.as_millis() as u64,
            "session supervisor started"
        );

        Self {
            registry,
            drain_timeout: config.drain_timeout(),
            worker: Mutex::new(Some(Worker { shutdown, handle })),
        }
    }

    /// Hands a binding to the supervisor.
    pub fn register(&self, outer: Arc<dyn Session>, inner: Arc<dyn Session>) -> BindingId {
        self.registry.register(outer, inner)
    }

    /// Number of bindings not yet finalized.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Stops the sweeper, running one last sweep.
    ///
    /// Waits at most the configured drain timeout. Returns the number of
    /// bindings left behind; those are abandoned with a warning. Calling
    /// `stop` again is a no-op that reports the current count.
    pub async fn stop(&self) -> usize {
        let worker = self.worker.lock().take();

        if let Some(Worker { shutdown, handle }) = worker {
            // The task may already be gone; the join below still applies.
            let _ = shutdown.send(());
            match tokio::time::timeout(self.drain_timeout, handle).await {
                Ok(Ok(())) => debug!("session supervisor drained"),
                Ok(Err(e)) => error!(error = %e, "session supervisor task failed"),
                Err(_) => warn!(
                    timeout_ms = self.drain_timeout.as_millis() as u64,
                    "session supervisor did not drain in time"
                ),
            }
        }

        let abandoned = self.registry.len();
        if abandoned > 0 {
            warn!(abandoned, "abandoning impersonation bindings at shutdown");
        }
        abandoned
    }
}

async fn run(registry: Arc<BindingRegistry>, interval: Duration, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                debug!("session supervisor shutting down");
                break;
            }

            _ = ticker.tick() => {
                sweep_blocking(&registry).await;
            }
        }
    }

    sweep_blocking(&registry).await;
}

async fn sweep_blocking(registry: &Arc<BindingRegistry>) {
    let registry = Arc::clone(registry);
    match tokio::task::spawn_blocking(move || registry.sweep()).await {
        Ok(report) => {
            if report.removed() > 0 {
                debug!(
                    committed = report.committed,
                    rolled_back = report.rolled_back,
                    failed = report.failed,
                    still_open = report.still_open,
                    "sweep finished"
                );
            }
        }
        Err(e) => error!(error = %e, "sweep task failed"),
    }
}
