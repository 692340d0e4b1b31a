//! Target check use case
//!
//! Checks every client folder under one monitored path: finds the client's
//! snapshot folder, lists its files and evaluates freshness. Clients are
//! processed sequentially so statuses come back in the order the storage
//! provider listed the client folders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    domain::{
        freshness, BackupStatus, CheckFailure, ClientFolder, MonitoredPath, ProviderError,
    },
    ports::IStorageProvider,
};

/// Default name of the per-client folder that holds snapshot files
pub const DEFAULT_SNAPSHOT_FOLDER: &str = "snapshots";

/// Use case producing one [`BackupStatus`] per client folder of a monitored path
pub struct TargetChecker {
    storage: Arc<dyn IStorageProvider>,
    snapshot_folder: String,
}

impl TargetChecker {
    /// Creates a checker that looks for `snapshot_folder` (exact,
    /// case-sensitive match) inside every client folder
    pub fn new(storage: Arc<dyn IStorageProvider>, snapshot_folder: impl Into<String>) -> Self {
        Self {
            storage,
            snapshot_folder: snapshot_folder.into(),
        }
    }

    pub fn snapshot_folder(&self) -> &str {
        &self.snapshot_folder
    }

    /// Checks every client under `path`
    ///
    /// # Errors
    ///
    /// Returns the provider error when the client folders of `path` cannot be
    /// listed. In that case the path contributes no statuses. Failures that
    /// concern a single client are reported as an errored status instead.
    pub async fn check(
        &self,
        path: &MonitoredPath,
        now: DateTime<Utc>,
    ) -> Result<Vec<BackupStatus>, ProviderError> {
        let clients = self.storage.list_subfolders(path.as_str()).await?;
        debug!(path = %path, clients = clients.len(), "Listed client folders");

        let mut statuses = Vec::with_capacity(clients.len());
        for client in &clients {
            statuses.push(self.check_client(path, client, now).await);
        }
        Ok(statuses)
    }

    async fn check_client(
        &self,
        path: &MonitoredPath,
        client: &ClientFolder,
        now: DateTime<Utc>,
    ) -> BackupStatus {
        let children = match self.storage.list_subfolders(&client.id).await {
            Ok(children) => children,
            Err(e) => {
                warn!(client = %client.name, error = %e, "Failed to list client folder");
                return BackupStatus::failed(
                    &client.name,
                    path.clone(),
                    &client.id,
                    CheckFailure::SubfolderListing(e),
                );
            }
        };

        let snapshots_id = children
            .iter()
            .find(|f| f.name == self.snapshot_folder)
            .map(|f| f.id.clone());
        let Some(snapshots_id) = snapshots_id else {
            let available: Vec<String> = children.into_iter().map(|f| f.name).collect();
            warn!(
                client = %client.name,
                folder = %self.snapshot_folder,
                available = ?available,
                "Snapshot folder not found"
            );
            return BackupStatus::failed(
                &client.name,
                path.clone(),
                &client.id,
                CheckFailure::SnapshotsFolderMissing {
                    folder: self.snapshot_folder.clone(),
                    available,
                },
            );
        };

        let files = match self.storage.list_files(&snapshots_id).await {
            Ok(files) => files,
            Err(e) => {
                warn!(client = %client.name, error = %e, "Failed to list snapshot files");
                return BackupStatus::failed(
                    &client.name,
                    path.clone(),
                    &client.id,
                    CheckFailure::FileListing(e),
                );
            }
        };

        let report = freshness::evaluate(&files, now);
        debug!(
            client = %client.name,
            files = files.len(),
            fresh = report.is_fresh,
            fresh_files = report.fresh_files,
            "Evaluated snapshot freshness"
        );

        BackupStatus::evaluated(&client.name, path.clone(), &client.id, report)
    }
}
