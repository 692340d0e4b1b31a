//! Notification service port (driven/secondary port)
//!
//! This module defines the interface for delivering backup alerts and cycle
//! summaries to the operator. The primary implementation posts messages to a
//! Telegram chat.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery failures are adapter-specific;
//!   the engine only logs them.
//! - Payloads are plain records built from the check results so adapters
//!   never depend on [`BackupStatus`] internals.

use serde::{Deserialize, Serialize};

use crate::domain::{BackupStatus, CheckCycleResult};

// ============================================================================
// Notification payloads
// ============================================================================

/// Alert raised for a client without a fresh snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupAlert {
    pub client_name: String,
    /// Monitored path the client folder lives under
    pub path: String,
    /// `YYYY-MM-DD HH:MM:SS UTC` or `Unknown`
    pub last_backup: String,
    /// Check failure message, if the client could not be evaluated
    pub error: Option<String>,
}

impl From<&BackupStatus> for BackupAlert {
    fn from(status: &BackupStatus) -> Self {
        Self {
            client_name: status.client_name().to_string(),
            path: status.path().to_string(),
            last_backup: status.last_backup_label(),
            error: status.error().map(ToString::to_string),
        }
    }
}

/// Confirmation that a client produced today's snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSuccess {
    pub client_name: String,
    pub path: String,
    /// Number of snapshot files created today
    pub file_count: usize,
}

impl From<&BackupStatus> for BackupSuccess {
    fn from(status: &BackupStatus) -> Self {
        Self {
            client_name: status.client_name().to_string(),
            path: status.path().to_string(),
            file_count: status.fresh_file_count(),
        }
    }
}

/// End-of-cycle report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub failed_clients: Vec<String>,
}

impl CycleSummary {
    pub fn all_good(&self) -> bool {
        self.failed == 0
    }
}

impl From<&CheckCycleResult> for CycleSummary {
    fn from(result: &CheckCycleResult) -> Self {
        Self {
            total: result.total(),
            success: result.success_count(),
            failed: result.failed_count(),
            failed_clients: result.failed_clients(),
        }
    }
}

// ============================================================================
// INotificationService trait
// ============================================================================

/// Port trait for operator notifications
///
/// ## Implementation Notes
///
/// - Each call is a single delivery attempt; the caller does not retry.
/// - `send_text` is used for ad-hoc messages such as a connectivity test.
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Sends an alert for one failed client
    async fn send_alert(&self, alert: &BackupAlert) -> anyhow::Result<()>;

    /// Sends a per-client success confirmation
    async fn send_success(&self, success: &BackupSuccess) -> anyhow::Result<()>;

    /// Sends the end-of-cycle summary
    async fn send_summary(&self, summary: &CycleSummary) -> anyhow::Result<()>;

    /// Sends a free-form message
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;
}
