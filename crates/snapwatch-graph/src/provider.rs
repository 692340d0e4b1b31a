//! GraphStorageProvider - IStorageProvider implementation for Microsoft Graph API
//!
//! Wraps the [`GraphClient`] and turns drive item listings into the typed
//! records the core works with.
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::RwLock` because `IStorageProvider` methods take `&self`
//!   while `GraphClient::set_access_token` requires `&mut self`.
//! - Listings never mix kinds: `list_subfolders` drops files and `list_files`
//!   drops folders.

use snapwatch_core::domain::{ClientFolder, ProviderError, SnapshotFile};
use snapwatch_core::ports::IStorageProvider;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{DriveItem, GraphClient};

/// `IStorageProvider` backed by OneDrive
pub struct GraphStorageProvider {
    client: RwLock<GraphClient>,
}

impl GraphStorageProvider {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client: RwLock::new(client),
        }
    }

    /// Lists the folders at the drive root, used to pick monitored paths
    pub async fn list_root_folders(&self) -> Result<Vec<ClientFolder>, ProviderError> {
        debug!("GraphStorageProvider::list_root_folders");
        let items = self.client.read().await.list_root_children().await?;
        Ok(folders_only(items))
    }
}

fn folders_only(items: Vec<DriveItem>) -> Vec<ClientFolder> {
    items
        .into_iter()
        .filter(DriveItem::is_folder)
        .map(DriveItem::into_client_folder)
        .collect()
}

#[async_trait::async_trait]
impl IStorageProvider for GraphStorageProvider {
    async fn set_access_token(&self, token: &str) {
        self.client.write().await.set_access_token(token);
    }

    async fn list_subfolders(&self, folder_id: &str) -> Result<Vec<ClientFolder>, ProviderError> {
        debug!(id = %folder_id, "GraphStorageProvider::list_subfolders");
        let items = self
            .client
            .read()
            .await
            .list_folder_children(folder_id)
            .await?;
        Ok(folders_only(items))
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<SnapshotFile>, ProviderError> {
        debug!(id = %folder_id, "GraphStorageProvider::list_files");
        let items = self
            .client
            .read()
            .await
            .list_folder_children(folder_id)
            .await?;

        let files = items
            .into_iter()
            .filter(DriveItem::is_file)
            .filter_map(|item| {
                let name = item.name.clone();
                let file = item.into_snapshot_file();
                if file.is_none() {
                    debug!(name = %name, "Skipping file without timestamps");
                }
                file
            })
            .collect();
        Ok(files)
    }
}
