//! Notify-test command - Verify Telegram delivery

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use snapwatch_core::ports::INotificationService;
use tracing::info;

use crate::output::{Output, OutputFormat};
use crate::session;

const TEST_MESSAGE: &str = "🔔 *SnapWatch Test*\n\nNotifications are working.";

/// Arguments for the notify-test subcommand
#[derive(Debug, Args)]
pub struct NotifyTestCommand {}

impl NotifyTestCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let fmt = Output::new(format);
        let config = session::load_config(config_path)?;
        let notifier = session::telegram(&config)?;

        info!(chat_id = notifier.chat_id(), "Sending test notification");
        notifier
            .send_text(TEST_MESSAGE)
            .await
            .context("Test notification failed")?;

        fmt.success(&format!("Test message sent to chat {}", notifier.chat_id()));
        Ok(())
    }
}
