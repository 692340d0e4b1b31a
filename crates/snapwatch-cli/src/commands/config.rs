//! Config command - View and manage SnapWatch configuration
//!
//! Provides the `snapwatch config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON) with the bot token masked
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Resets the file to defaults and prints its location

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use snapwatch_core::config::{mask_secret, Config};
use tracing::info;

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`, with a short description
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("storage.monitor_paths", "Comma-separated drive item IDs"),
    ("storage.snapshot_folder", "Per-client snapshot folder name"),
    ("monitoring.enabled", "true|false"),
    ("monitoring.check_interval_minutes", "Minutes between checks"),
    ("monitoring.notify_success", "true|false"),
    ("telegram.bot_token", "Bot token from @BotFather"),
    ("telegram.chat_id", "Chat receiving notifications"),
    ("auth.client_id", "Azure AD application ID"),
    ("auth.tenant", "common|organizations|consumers|<tenant id>"),
    ("network.request_timeout_secs", "Per-request timeout"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "text|json"),
];

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "monitoring.check_interval_minutes")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Overwrite the configuration file with defaults
    Reset,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(config_path, format),
            ConfigCommand::Set { key, value } => {
                self.execute_set(config_path, key, value, format)
            }
            ConfigCommand::Validate => self.execute_validate(config_path, format),
            ConfigCommand::Reset => self.execute_reset(config_path, format),
            ConfigCommand::Path => self.execute_path(config_path, format),
        }
    }

    fn execute_show(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = Output::new(format);
        let config = masked(Config::load_or_default(config_path));

        info!(config_path = %config_path.display(), "Showing configuration");

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.emit(&json)?;
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(
        &self,
        config_path: &Path,
        key: &str,
        value: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = Output::new(format);
        let mut config = Config::load_or_default(config_path);

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if !format.is_json() {
                formatter.info("Supported keys:");
                for (key, help) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {key:<36} - {help}"));
                }
            }
            return Err(e);
        }

        let errors: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
        if !errors.is_empty() {
            anyhow::bail!("Invalid value for '{}': {}", key, errors.join("; "));
        }

        config.save(config_path)?;
        info!(key = %key, "Configuration value set");

        let shown = if key == "telegram.bot_token" {
            mask_secret(value)
        } else {
            value.to_string()
        };

        if format.is_json() {
            formatter.emit(&serde_json::json!({
                "key": key,
                "value": shown,
                "config_path": config_path.display().to_string(),
            }))?;
        } else {
            formatter.success(&format!("Set {} = {}", key, shown));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }
        Ok(())
    }

    fn execute_validate(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = Output::new(format);

        if !config_path.exists() {
            anyhow::bail!(
                "Configuration file not found at {}",
                config_path.display()
            );
        }
        let config = Config::load(config_path)?;

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();
        let configured = config.is_configured();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
            formatter.emit(&serde_json::json!({
                "valid": errors.is_empty(),
                "configured": configured,
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }))?;
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
            if !configured {
                formatter.warn(
                    "Not ready to monitor: telegram.bot_token, telegram.chat_id and storage.monitor_paths are required",
                );
            }
        } else {
            formatter.info(&format!("File: {}", config_path.display()));
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration has {} error{}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }

    fn execute_reset(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = Output::new(format);
        Config::default().save(config_path)?;
        info!(config_path = %config_path.display(), "Configuration reset");

        if format.is_json() {
            formatter.emit(&serde_json::json!({
                "config_path": config_path.display().to_string(),
            }))?;
        } else {
            formatter.success(&format!(
                "Configuration reset to defaults ({})",
                config_path.display()
            ));
        }
        Ok(())
    }

    fn execute_path(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        if format.is_json() {
            Output::new(format).emit(&serde_json::json!({
                "config_path": config_path.display().to_string(),
                "exists": config_path.exists(),
            }))?;
        } else {
            println!("{}", config_path.display());
        }
        Ok(())
    }
}

/// Replaces the bot token with its masked form for display
fn masked(mut config: Config) -> Config {
    config.telegram.bot_token = config.telegram.bot_token.as_deref().map(mask_secret);
    config
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("Expected true or false for {key}"),
    }
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- storage ---
        "storage.monitor_paths" => {
            config.storage.monitor_paths = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        "storage.snapshot_folder" => {
            config.storage.snapshot_folder = value.to_string();
        }

        // --- monitoring ---
        "monitoring.enabled" => {
            config.monitoring.enabled = parse_bool(key, value)?;
        }
        "monitoring.check_interval_minutes" => {
            config.monitoring.check_interval_minutes = value
                .parse::<u64>()
                .context("Expected a positive integer for monitoring.check_interval_minutes")?;
        }
        "monitoring.notify_success" => {
            config.monitoring.notify_success = parse_bool(key, value)?;
        }

        // --- telegram ---
        "telegram.bot_token" => {
            config.telegram.bot_token = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "telegram.chat_id" => {
            config.telegram.chat_id = if value.is_empty() || value == "none" {
                None
            } else {
                Some(
                    value
                        .parse::<i64>()
                        .context("Expected an integer for telegram.chat_id")?,
                )
            };
        }

        // --- auth ---
        "auth.client_id" => {
            config.auth.client_id = value.to_string();
        }
        "auth.tenant" => {
            config.auth.tenant = value.to_string();
        }

        // --- network ---
        "network.request_timeout_secs" => {
            config.network.request_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for network.request_timeout_secs")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }
        "logging.format" => {
            config.logging.format = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
