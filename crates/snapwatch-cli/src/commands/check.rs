//! Check command - Run one backup check cycle now
//!
//! Builds the same engine the daemon uses and runs a single cycle. Alerts and
//! the summary go to Telegram as usual; the per-client result is printed.
//! The command fails only when the cycle itself cannot run (configuration or
//! credential problems, or the daemon being mid-cycle). Stale clients are
//! reported, not treated as errors.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use snapwatch_core::config::Config;
use snapwatch_core::domain::{BackupStatus, CheckCycleResult, MonitoredPath};
use snapwatch_core::ports::ICredentialStore;
use snapwatch_graph::client::GraphClient;
use snapwatch_graph::provider::GraphStorageProvider;
use snapwatch_monitor::{CheckEngine, CycleLock, MonitorError};
use tracing::info;
use uuid::Uuid;

use crate::output::{Output, OutputFormat};
use crate::session;

/// Arguments for the check subcommand
#[derive(Debug, Args)]
pub struct CheckCommand {}

impl CheckCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let out = Output::new(format);
        let config = session::load_config(config_path)?;
        if !config.is_configured() {
            anyhow::bail!(
                "SnapWatch is not configured: set telegram.bot_token, telegram.chat_id and storage.monitor_paths"
            );
        }

        let store = session::credential_store();
        let credential = store
            .load()
            .context("Failed to load stored credential")?
            .unwrap_or_default();

        // The engine installs a fresh token before the first listing.
        let client = GraphClient::new(String::new(), config.request_timeout())
            .context("Failed to create Graph client")?;

        let engine = CheckEngine::new(
            Arc::new(GraphStorageProvider::new(client)),
            Arc::new(session::auth_adapter(&config)?),
            store,
            Arc::new(session::telegram(&config)?),
            credential,
        )
        .with_paths(config.monitored_paths()?)
        .with_snapshot_folder(&config.storage.snapshot_folder)
        .with_notify_success(config.monitoring.notify_success)
        .with_cycle_lock(CycleLock::new(Config::cycle_lock_path()));

        info!(paths = engine.paths().len(), "Running manual check");
        let result = match engine.run_cycle().await {
            Ok(result) => result,
            Err(MonitorError::CycleInProgress) => anyhow::bail!(
                "Another check is running (daemon cycle in progress); try again shortly"
            ),
            Err(e) => return Err(e).context("Backup check failed"),
        };

        let report = CheckReport::from(&result);
        out.emit(&report)?;
        if !out.is_json() {
            print_human(&report, &result, &out);
        }
        Ok(())
    }
}

/// What `check` reports, in both output modes
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    cycle_id: Uuid,
    started_at: DateTime<Utc>,
    total: usize,
    success: usize,
    failed: usize,
    all_good: bool,
    statuses: &'a [BackupStatus],
    skipped_paths: &'a [MonitoredPath],
}

impl<'a> From<&'a CheckCycleResult> for CheckReport<'a> {
    fn from(result: &'a CheckCycleResult) -> Self {
        Self {
            cycle_id: result.cycle_id,
            started_at: result.started_at,
            total: result.total(),
            success: result.success_count(),
            failed: result.failed_count(),
            all_good: result.all_good(),
            statuses: &result.statuses,
            skipped_paths: &result.skipped_paths,
        }
    }
}

fn print_human(report: &CheckReport<'_>, result: &CheckCycleResult, out: &Output) {
    if !result.statuses.is_empty() {
        out.status_table(&result.statuses);
        println!();
    }
    for status in result.failed_statuses() {
        out.warn(&failure_line(status));
    }
    for path in report.skipped_paths {
        out.warn(&format!("Could not list clients under {path}"));
    }

    if report.all_good && report.skipped_paths.is_empty() {
        out.success("All clients backed up today");
    }
    out.info(&format!(
        "Total: {}  Successful: {}  Failed: {}",
        report.total, report.success, report.failed
    ));
}

fn failure_line(status: &BackupStatus) -> String {
    match status.error() {
        Some(error) => format!("{}: {}", status.client_name(), error),
        None => format!(
            "{}: no backup today (last backup: {})",
            status.client_name(),
            status.last_backup_label()
        ),
    }
}
