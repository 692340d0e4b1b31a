//! Folders command - Browse drive folders to find monitored path IDs
//!
//! Monitored paths are configured by drive item ID. `snapwatch folders` lists
//! the root folders, and `--parent <ID>` lists the folders inside one of them.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use snapwatch_core::config::Config;
use snapwatch_core::ports::IStorageProvider;

use crate::output::{Output, OutputFormat};
use crate::session;

/// Arguments for the folders subcommand
#[derive(Debug, Args)]
pub struct FoldersCommand {
    /// List the folders inside this drive item instead of the drive root
    #[arg(long)]
    pub parent: Option<String>,
}

impl FoldersCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let fmt = Output::new(format);
        let config = Config::load_or_default(config_path);
        let storage = session::authorized_storage(&config).await?;

        let folders = match &self.parent {
            Some(parent) => storage
                .list_subfolders(parent)
                .await
                .with_context(|| format!("Failed to list folders under {parent}"))?,
            None => storage
                .list_root_folders()
                .await
                .context("Failed to list root folders")?,
        };

        if format.is_json() {
            return fmt.emit(&folders);
        }

        if folders.is_empty() {
            fmt.info("No folders found");
            return Ok(());
        }

        let width = folders.iter().map(|f| f.name.len()).max().unwrap_or(0);
        for folder in &folders {
            fmt.info(&format!("{:<width$}  {}", folder.name, folder.id));
        }
        fmt.info("");
        fmt.info("Add a folder with: snapwatch config set storage.monitor_paths <ID>[,<ID>...]");
        Ok(())
    }
}
