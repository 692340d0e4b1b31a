//! SnapWatch Monitor - Backup check engine and scheduler
//!
//! Provides:
//! - One check cycle across every monitored path, under a single-flight guard
//! - Alert, success and summary dispatch
//! - The periodic scheduler loop with cooperative cancellation
//!
//! ## Modules
//!
//! - [`engine`] - `CheckEngine`, the cycle orchestrator
//! - [`scheduler`] - `MonitorScheduler` and its control handle
//! - [`lock`] - `CycleLock`, mutual exclusion across processes

pub mod engine;
pub mod lock;
pub mod scheduler;

pub use engine::CheckEngine;
pub use lock::CycleLock;
pub use scheduler::{MonitorHandle, MonitorScheduler, SchedulerState};

use std::path::PathBuf;

use snapwatch_core::domain::CredentialError;
use thiserror::Error;

/// Errors that abort a whole check cycle
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The credential could not be made valid; no target was checked
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Another cycle holds the guard: the in-process one for
    /// `try_run_cycle`, the cycle lock file for any entry point
    #[error("A check cycle is already in progress")]
    CycleInProgress,

    /// The cycle lock file could not be opened or locked
    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
