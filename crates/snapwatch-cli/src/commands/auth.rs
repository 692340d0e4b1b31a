//! Auth commands - Login, Logout, and Status for OneDrive authentication
//!
//! Provides the `snapwatch auth` CLI subcommands which:
//! 1. `login`  - Runs the OAuth2 device code flow and stores the credential
//!    in the system keyring.
//! 2. `logout` - Clears the credential from the keyring.
//! 3. `status` - Shows whether a credential exists and when it expires.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use snapwatch_core::config::Config;
use snapwatch_core::domain::Credential;
use snapwatch_core::ports::{IAuthProvider, ICredentialStore};
use snapwatch_graph::auth::DeviceCodePrompt;
use tracing::info;

use crate::output::{Output, OutputFormat};
use crate::session;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authenticate with OneDrive using a device code
    Login {
        /// Do not try to open the verification page in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Remove stored credentials
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let fmt = Output::new(format);
        match self {
            AuthCommand::Login { no_browser } => {
                self.execute_login(config_path, !no_browser, &fmt).await
            }
            AuthCommand::Logout => self.execute_logout(&fmt),
            AuthCommand::Status => self.execute_status(&fmt, format),
        }
    }

    /// Runs the device code flow and persists the resulting credential
    async fn execute_login(
        &self,
        config_path: &Path,
        open_browser: bool,
        fmt: &Output,
    ) -> Result<()> {
        // Auth settings have usable defaults, so a missing file is fine here.
        let config = Config::load_or_default(config_path);
        info!(client_id = %config.auth.client_id, tenant = %config.auth.tenant, "Starting device code login");

        let adapter = session::auth_adapter(&config)?
            .with_browser(open_browser)
            .with_prompt(Arc::new(|prompt: &DeviceCodePrompt| {
                eprintln!(
                    "To sign in, open {} and enter the code {} (valid for {} minutes)",
                    prompt.verification_uri,
                    prompt.user_code,
                    prompt.expires_in.as_secs() / 60
                );
            }));

        let grant = adapter
            .authenticate()
            .await
            .context("Device code login failed")?;
        let credential = grant.into_credential(None, Utc::now());

        session::credential_store()
            .save(&credential)
            .context("Failed to store credential in keyring")?;

        fmt.success("Authenticated with OneDrive");
        if let Some(expires_at) = credential.expires_at {
            fmt.info(&format!("Access token valid until {}", expires_at.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        Ok(())
    }

    fn execute_logout(&self, fmt: &Output) -> Result<()> {
        session::credential_store()
            .clear()
            .context("Failed to clear credential from keyring")?;
        info!("Logged out");
        fmt.success("Logged out. Stored credential removed.");
        Ok(())
    }

    fn execute_status(&self, fmt: &Output, format: OutputFormat) -> Result<()> {
        let credential = session::credential_store()
            .load()
            .context("Failed to read credential from keyring")?;

        let report = StatusReport::from_credential(credential.as_ref(), Utc::now());

        if format.is_json() {
            return fmt.emit(&report);
        }

        if !report.authenticated {
            fmt.warn("Not authenticated. Run 'snapwatch auth login'.");
            return Ok(());
        }

        fmt.success("Authenticated");
        if let Some(expires_at) = &report.expires_at {
            fmt.info(&format!("Expires at: {expires_at}"));
        }
        match report.expires_in_minutes {
            Some(minutes) if minutes > 0 => {
                fmt.info(&format!("Expires in: {minutes} minutes"))
            }
            _ => fmt.info("Access token expired; it is refreshed on the next check"),
        }
        if !report.has_refresh_token {
            fmt.warn("No refresh token stored; log in again before the token expires");
        }
        Ok(())
    }
}

/// What `auth status` reports about the stored credential
#[derive(Debug, PartialEq, Serialize)]
struct StatusReport {
    authenticated: bool,
    expires_at: Option<String>,
    expires_in_minutes: Option<i64>,
    has_refresh_token: bool,
}

impl StatusReport {
    fn from_credential(credential: Option<&Credential>, now: chrono::DateTime<Utc>) -> Self {
        let Some(credential) = credential.filter(|c| c.is_authenticated()) else {
            return Self {
                authenticated: false,
                expires_at: None,
                expires_in_minutes: None,
                has_refresh_token: false,
            };
        };

        Self {
            authenticated: true,
            expires_at: credential
                .expires_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            expires_in_minutes: credential.time_remaining(now).map(|d| d.num_minutes()),
            has_refresh_token: credential.refresh_token.is_some(),
        }
    }
}
