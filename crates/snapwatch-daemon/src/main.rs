//! SnapWatch Daemon - Background backup monitoring service
//!
//! This binary runs as a systemd service and handles:
//! - Periodic backup checks on the configured interval
//! - Telegram alerts and summaries
//! - Graceful shutdown on SIGTERM/SIGINT
//! - An immediate check on SIGUSR1
//!
//! # Architecture
//!
//! The daemon wires the Graph, Telegram and keyring adapters into a
//! `CheckEngine`, hands it to a `MonitorScheduler` and waits. Signals reach
//! the scheduler through its `MonitorHandle`.

use std::sync::Arc;

use anyhow::{Context, Result};
use snapwatch_core::config::Config;
use snapwatch_core::ports::ICredentialStore;
use snapwatch_graph::{
    auth::{DeviceCodeConfig, GraphAuthAdapter, KeyringCredentialStore},
    client::GraphClient,
    provider::GraphStorageProvider,
};
use snapwatch_monitor::{CheckEngine, CycleLock, MonitorHandle, MonitorScheduler};
use snapwatch_telegram::TelegramNotifier;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Wiring
// ============================================================================

/// Builds the check engine from the configuration and the stored credential
fn build_engine(config: &Config) -> Result<CheckEngine> {
    let timeout = config.request_timeout();

    let token = config
        .telegram
        .bot_token
        .clone()
        .context("telegram.bot_token is not set")?;
    let chat_id = config.telegram.chat_id.context("telegram.chat_id is not set")?;
    let notifier =
        TelegramNotifier::new(token, chat_id, timeout).context("Failed to create Telegram client")?;

    let store = Arc::new(KeyringCredentialStore::new());
    let credential = match store.load().context("Failed to read credential from keyring")? {
        Some(credential) => credential,
        None => {
            warn!("No stored credential. Run 'snapwatch auth login'; cycles fail until then.");
            Default::default()
        }
    };

    let auth = GraphAuthAdapter::new(
        &DeviceCodeConfig::new(&config.auth.client_id, &config.auth.tenant)
            .with_request_timeout(timeout),
    )?;

    // The engine installs a fresh token before the first listing.
    let client = GraphClient::new(String::new(), timeout).context("Failed to create Graph client")?;

    Ok(CheckEngine::new(
        Arc::new(GraphStorageProvider::new(client)),
        Arc::new(auth),
        store,
        Arc::new(notifier),
        credential,
    )
    .with_paths(config.monitored_paths()?)
    .with_snapshot_folder(&config.storage.snapshot_folder)
    .with_notify_success(config.monitoring.notify_success)
    .with_cycle_lock(CycleLock::new(Config::cycle_lock_path())))
}

// ============================================================================
// Signals
// ============================================================================

/// Waits for SIGINT or SIGTERM, then stops the scheduler
async fn shutdown_signal(handle: MonitorHandle) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    handle.stop();
}

/// Runs a manual check for every SIGUSR1 until `shutdown` fires
#[cfg(unix)]
async fn manual_check_signal(handle: MonitorHandle, shutdown: CancellationToken) {
    let mut usr1 = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())
        .expect("Failed to install SIGUSR1 handler");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = usr1.recv() => {
                if received.is_none() {
                    break;
                }
                info!("Received SIGUSR1, running manual check");
                match handle.check_now().await {
                    Ok(result) => info!(
                        cycle_id = %result.cycle_id,
                        total = result.total(),
                        failed = result.failed_count(),
                        "Manual check finished"
                    ),
                    Err(e) => error!(error = %e, "Manual check failed"),
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn manual_check_signal(_handle: MonitorHandle, shutdown: CancellationToken) {
    shutdown.cancelled().await;
}

// ============================================================================
// Logging
// ============================================================================

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load(&config_path)
        .with_context(|| format!("Run 'snapwatch config set' to create {}", config_path.display()))?;

    init_tracing(&config);
    info!(config_path = %config_path.display(), "SnapWatch daemon starting (snapwatchd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!(field = %e.field, message = %e.message, "Invalid configuration");
        }
        anyhow::bail!("Configuration has {} error(s)", errors.len());
    }
    if !config.is_configured() {
        anyhow::bail!(
            "SnapWatch is not configured: set telegram.bot_token, telegram.chat_id and storage.monitor_paths"
        );
    }

    let engine = Arc::new(build_engine(&config)?);
    let scheduler = MonitorScheduler::new(
        engine,
        config.check_interval(),
        config.monitoring.enabled,
    );
    let handle = scheduler.handle();

    let signals_done = CancellationToken::new();
    tokio::spawn(shutdown_signal(handle.clone()));
    let manual = tokio::spawn(manual_check_signal(handle.clone(), signals_done.clone()));

    scheduler.run().await;

    signals_done.cancel();
    if let Err(e) = manual.await {
        warn!(error = %e, "Manual check task ended abnormally");
    }

    info!("SnapWatch daemon shut down gracefully");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
