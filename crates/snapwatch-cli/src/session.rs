//! Adapter wiring shared by the commands
//!
//! Every command builds its collaborators from the same configuration file
//! and the same keyring entry, so the wiring lives here once.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use snapwatch_core::config::Config;
use snapwatch_core::ports::ICredentialStore;
use snapwatch_core::usecases::CredentialRefresher;
use snapwatch_graph::auth::{DeviceCodeConfig, GraphAuthAdapter, KeyringCredentialStore};
use snapwatch_graph::client::GraphClient;
use snapwatch_graph::provider::GraphStorageProvider;
use snapwatch_telegram::TelegramNotifier;

/// Loads the config file and rejects invalid values
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found at {}. Run 'snapwatch config set <key> <value>' to create one.",
            path.display()
        );
    }
    let config = Config::load(path)?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", messages.join("; "));
    }
    Ok(config)
}

pub fn auth_adapter(config: &Config) -> Result<GraphAuthAdapter> {
    let device = DeviceCodeConfig::new(&config.auth.client_id, &config.auth.tenant)
        .with_request_timeout(config.request_timeout());
    GraphAuthAdapter::new(&device)
}

pub fn credential_store() -> Arc<KeyringCredentialStore> {
    Arc::new(KeyringCredentialStore::new())
}

/// Storage provider holding a fresh access token
pub async fn authorized_storage(config: &Config) -> Result<GraphStorageProvider> {
    let store = credential_store();
    let credential = store
        .load()
        .context("Failed to load stored credential")?
        .unwrap_or_default();

    let refresher = CredentialRefresher::new(Arc::new(auth_adapter(config)?), store);
    let credential = refresher.ensure_valid(&credential, Utc::now()).await?;

    let client = GraphClient::new(credential.access_token, config.request_timeout())
        .context("Failed to create Graph client")?;
    Ok(GraphStorageProvider::new(client))
}

/// Telegram notifier for the configured bot and chat
pub fn telegram(config: &Config) -> Result<TelegramNotifier> {
    let token = config
        .telegram
        .bot_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("telegram.bot_token is not set")?;
    let chat_id = config
        .telegram
        .chat_id
        .context("telegram.chat_id is not set")?;

    TelegramNotifier::new(token, chat_id, config.request_timeout())
        .context("Failed to create Telegram client")
}
