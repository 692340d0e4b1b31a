//! Freshness evaluation
//!
//! A client is fresh when at least one snapshot file was created on the
//! current UTC calendar day. The comparison truncates both instants to the
//! UTC date: a file created at 23:59 yesterday is stale at 00:01 today, and a
//! file created at 00:01 today is fresh at 23:59 today.

use chrono::{DateTime, Utc};

use super::snapshot::SnapshotFile;

/// Outcome of evaluating one client's snapshot listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessReport {
    /// True if at least one file was created on the current UTC day
    pub is_fresh: bool,
    /// Number of files created on the current UTC day
    pub fresh_files: usize,
    /// Latest creation time across all files; `None` for an empty listing
    pub most_recent: Option<DateTime<Utc>>,
}

/// Returns true if `created_at` falls on the same UTC calendar day as `now`
pub fn is_same_utc_day(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    created_at.date_naive() == now.date_naive()
}

/// Evaluate a snapshot listing against `now`
pub fn evaluate(files: &[SnapshotFile], now: DateTime<Utc>) -> FreshnessReport {
    let fresh_files = files
        .iter()
        .filter(|file| is_same_utc_day(file.created_at, now))
        .count();

    let most_recent = files.iter().map(|file| file.created_at).max();

    FreshnessReport {
        is_fresh: fresh_files > 0,
        fresh_files,
        most_recent,
    }
}
