//! Per-client check results and their per-cycle aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::CheckFailure;
use super::freshness::FreshnessReport;
use super::newtypes::MonitoredPath;

/// Label used when a client has never produced a snapshot
pub const UNKNOWN_LAST_BACKUP: &str = "Unknown";

/// Result of checking one client folder in one cycle
///
/// Instances are created through [`BackupStatus::evaluated`] or
/// [`BackupStatus::failed`] and cannot be mutated afterwards. An errored
/// status is never fresh and reports zero fresh files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupStatus {
    client_name: String,
    path: MonitoredPath,
    client_folder_id: String,
    is_fresh: bool,
    fresh_file_count: usize,
    last_backup: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_failure")]
    error: Option<CheckFailure>,
}

fn serialize_failure<S>(failure: &Option<CheckFailure>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match failure {
        Some(failure) => serializer.serialize_some(&failure.to_string()),
        None => serializer.serialize_none(),
    }
}

impl BackupStatus {
    /// Status for a client whose snapshot listing was evaluated
    pub fn evaluated(
        client_name: impl Into<String>,
        path: MonitoredPath,
        client_folder_id: impl Into<String>,
        report: FreshnessReport,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            path,
            client_folder_id: client_folder_id.into(),
            is_fresh: report.is_fresh,
            fresh_file_count: report.fresh_files,
            last_backup: report.most_recent,
            error: None,
        }
    }

    /// Status for a client that could not be evaluated
    pub fn failed(
        client_name: impl Into<String>,
        path: MonitoredPath,
        client_folder_id: impl Into<String>,
        error: CheckFailure,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            path,
            client_folder_id: client_folder_id.into(),
            is_fresh: false,
            fresh_file_count: 0,
            last_backup: None,
            error: Some(error),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn path(&self) -> &MonitoredPath {
        &self.path
    }

    pub fn client_folder_id(&self) -> &str {
        &self.client_folder_id
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh
    }

    pub fn fresh_file_count(&self) -> usize {
        self.fresh_file_count
    }

    pub fn last_backup(&self) -> Option<DateTime<Utc>> {
        self.last_backup
    }

    pub fn error(&self) -> Option<&CheckFailure> {
        self.error.as_ref()
    }

    /// True if the client produced a snapshot today and was checked without error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.is_fresh
    }

    /// Human-readable label for the most recent snapshot
    ///
    /// Formatted as `YYYY-MM-DD HH:MM:SS UTC`, or `Unknown` when no snapshot
    /// was ever seen.
    pub fn last_backup_label(&self) -> String {
        match self.last_backup {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => UNKNOWN_LAST_BACKUP.to_string(),
        }
    }
}

/// Aggregate of every status produced by one check cycle
#[derive(Debug, Clone, Serialize)]
pub struct CheckCycleResult {
    /// Correlation id for log lines belonging to this cycle
    pub cycle_id: Uuid,
    /// Instant the cycle was evaluated against
    pub started_at: DateTime<Utc>,
    /// Per-client statuses in check order
    pub statuses: Vec<BackupStatus>,
    /// Monitored paths whose client listing failed
    pub skipped_paths: Vec<MonitoredPath>,
}

impl CheckCycleResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at,
            statuses: Vec::new(),
            skipped_paths: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    pub fn success_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_success()).count()
    }

    /// Always `total() - success_count()`
    pub fn failed_count(&self) -> usize {
        self.total() - self.success_count()
    }

    /// Statuses that are errored or stale, in check order
    pub fn failed_statuses(&self) -> impl Iterator<Item = &BackupStatus> {
        self.statuses.iter().filter(|s| !s.is_success())
    }

    /// Client names of [`failed_statuses`](Self::failed_statuses)
    pub fn failed_clients(&self) -> Vec<String> {
        self.failed_statuses()
            .map(|s| s.client_name().to_string())
            .collect()
    }

    pub fn all_good(&self) -> bool {
        self.failed_count() == 0
    }
}
