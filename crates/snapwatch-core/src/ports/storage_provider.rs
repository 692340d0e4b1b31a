//! Storage provider port (driven/secondary port)
//!
//! This module defines the interface the check engine uses to browse the
//! remote drive holding the backup snapshots. The primary implementation
//! targets OneDrive via the Microsoft Graph API.
//!
//! ## Design Notes
//!
//! - Returns [`ProviderError`] so the engine can tell a missing folder from a
//!   network failure without knowing anything about HTTP.
//! - Each call is expected to carry its own bounded timeout; a timeout is
//!   reported as [`ProviderError::Timeout`].
//! - Listings are fully paginated by the implementation.

use crate::domain::{ClientFolder, ProviderError, SnapshotFile};

// ============================================================================
// IStorageProvider trait
// ============================================================================

/// Port trait for read-only folder browsing
#[async_trait::async_trait]
pub trait IStorageProvider: Send + Sync {
    /// Replaces the bearer token used by subsequent calls
    async fn set_access_token(&self, token: &str);

    /// Lists the direct sub-folders of `folder_id`
    ///
    /// # Errors
    /// `NotFound` if the folder does not exist, `Transport`/`Timeout` on
    /// network failures.
    async fn list_subfolders(&self, folder_id: &str) -> Result<Vec<ClientFolder>, ProviderError>;

    /// Lists the files directly inside `folder_id`; sub-folders are skipped
    async fn list_files(&self, folder_id: &str) -> Result<Vec<SnapshotFile>, ProviderError>;
}
