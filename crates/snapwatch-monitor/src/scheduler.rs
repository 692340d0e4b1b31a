//! Monitor scheduler - runs check cycles on a fixed interval
//!
//! The [`MonitorScheduler`] owns the loop; a cloneable [`MonitorHandle`]
//! observes its state, stops it from any task and triggers manual checks.
//!
//! ## States
//!
//! ```text
//! Idle ──→ Running ──→ Waiting ──→ Running ──→ ...
//!            │            │
//!            └────────────┴──→ Stopping ──→ Stopped
//! ```
//!
//! Cancellation is cooperative: it is observed while waiting and between
//! cycles. A cycle that has started always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use snapwatch_core::domain::CheckCycleResult;

use crate::engine::CheckEngine;
use crate::MonitorError;

/// Lifecycle of the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, loop not started
    Idle,
    /// A cycle is executing
    Running,
    /// Sleeping until the next cycle
    Waiting,
    /// Stop observed, leaving the loop
    Stopping,
    /// Loop exited
    Stopped,
}

/// Periodic driver for [`CheckEngine::run_cycle`]
pub struct MonitorScheduler {
    engine: Arc<CheckEngine>,
    interval: Duration,
    enabled: bool,
    state_tx: watch::Sender<SchedulerState>,
    cancel: CancellationToken,
}

impl MonitorScheduler {
    /// Creates a scheduler; a disabled scheduler stops without running a cycle
    pub fn new(engine: Arc<CheckEngine>, interval: Duration, enabled: bool) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        info!(
            interval_secs = interval.as_secs(),
            enabled,
            "Creating monitor scheduler"
        );
        Self {
            engine,
            interval,
            enabled,
            state_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a handle usable from other tasks
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            engine: self.engine.clone(),
            state_rx: self.state_tx.subscribe(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: SchedulerState) {
        debug!(?state, "Scheduler state change");
        self.state_tx.send_replace(state);
    }

    /// Runs cycles until stopped
    ///
    /// Cycle failures are logged and the loop carries on with the next wait.
    pub async fn run(self) {
        if !self.enabled {
            info!("Monitoring disabled, scheduler not started");
            self.set_state(SchedulerState::Stopped);
            return;
        }

        info!("Monitor scheduler starting");

        while !self.cancel.is_cancelled() {
            self.set_state(SchedulerState::Running);
            match self.engine.run_cycle().await {
                Ok(result) => debug!(
                    cycle_id = %result.cycle_id,
                    failed = result.failed_count(),
                    "Scheduled cycle finished"
                ),
                Err(e) => error!(error = %e, "Scheduled check cycle failed"),
            }

            self.set_state(SchedulerState::Waiting);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.set_state(SchedulerState::Stopping);
        info!("Monitor scheduler stopped");
        self.set_state(SchedulerState::Stopped);
    }
}

/// Control handle for a running [`MonitorScheduler`]
#[derive(Clone)]
pub struct MonitorHandle {
    engine: Arc<CheckEngine>,
    state_rx: watch::Receiver<SchedulerState>,
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Requests the loop to stop; safe to call more than once
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Scheduler stop requested");
        }
        self.cancel.cancel();
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Waits until the scheduler reaches `state`
    ///
    /// Returns immediately if the scheduler was dropped.
    pub async fn wait_for(&self, state: SchedulerState) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|s| *s == state).await;
    }

    /// Runs a cycle now, outside the schedule, under the same guard
    pub async fn check_now(&self) -> Result<CheckCycleResult, MonitorError> {
        info!("Manual check requested");
        self.engine.run_cycle().await
    }
}
