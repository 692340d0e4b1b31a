//! TelegramNotifier - INotificationService implementation for the Bot API
//!
//! Every notification is a single `sendMessage` call. The Bot API reports
//! refusals in the body (`{"ok": false, "description": ...}`), so the body is
//! checked even on HTTP 200.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use snapwatch_core::ports::{BackupAlert, BackupSuccess, CycleSummary, INotificationService};
use tracing::{debug, info};

use crate::messages;
use crate::TelegramError;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

const PARSE_MODE: &str = "Markdown";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts notifications to one Telegram chat
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: i64,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        Self::with_base_url(bot_token, chat_id, TELEGRAM_API_URL, timeout)
    }

    /// Creates a notifier against a custom Bot API host (useful for testing)
    pub fn with_base_url(
        bot_token: impl Into<String>,
        chat_id: i64,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            bot_token: bot_token.into(),
            chat_id,
        })
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    /// Sends `text` with Markdown parsing enabled
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        // The token is part of the path; never log the URL.
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.bot_token
        );
        let body = SendMessageRequest {
            chat_id: self.chat_id,
            text,
            parse_mode: PARSE_MODE,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::NetworkError(e.without_url()))?;
        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| TelegramError::NetworkError(e.without_url()))?;

        let parsed: ApiResponse = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::UnexpectedStatus {
                    status: status.as_u16(),
                    description: raw,
                })
            }
            Err(e) => return Err(TelegramError::InvalidResponse(e.to_string())),
        };

        if !parsed.ok {
            return Err(TelegramError::Transport(
                parsed
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }

        debug!(chat_id = self.chat_id, chars = text.len(), "Telegram message sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl INotificationService for TelegramNotifier {
    async fn send_alert(&self, alert: &BackupAlert) -> anyhow::Result<()> {
        self.send_message(&messages::alert_message(alert))
            .await
            .with_context(|| format!("Failed to send alert for {}", alert.client_name))?;
        info!(client = %alert.client_name, "Backup alert sent");
        Ok(())
    }

    async fn send_success(&self, success: &BackupSuccess) -> anyhow::Result<()> {
        self.send_message(&messages::success_message(success))
            .await
            .with_context(|| format!("Failed to send success for {}", success.client_name))?;
        Ok(())
    }

    async fn send_summary(&self, summary: &CycleSummary) -> anyhow::Result<()> {
        self.send_message(&messages::summary_message(summary))
            .await
            .context("Failed to send cycle summary")?;
        info!(
            total = summary.total,
            failed = summary.failed,
            "Cycle summary sent"
        );
        Ok(())
    }

    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        self.send_message(text)
            .await
            .context("Failed to send Telegram message")
    }
}
