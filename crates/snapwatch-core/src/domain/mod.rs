//! Domain entities and business logic
//!
//! This module contains the core domain types for SnapWatch:
//! - Newtypes for validated identifiers
//! - Storage listing records (client folders, snapshot files)
//! - The freshness evaluator
//! - Per-client statuses and the per-cycle aggregate
//! - The OAuth credential
//! - Domain-specific error types

pub mod credential;
pub mod errors;
pub mod freshness;
pub mod newtypes;
pub mod snapshot;
pub mod status;

// Re-export commonly used types
pub use credential::{Credential, TokenGrant};
pub use errors::{CheckFailure, CredentialError, DomainError, ProviderError};
pub use freshness::{evaluate, FreshnessReport};
pub use newtypes::MonitoredPath;
pub use snapshot::{ClientFolder, SnapshotFile};
pub use status::{BackupStatus, CheckCycleResult, UNKNOWN_LAST_BACKUP};
