//! SnapWatch Telegram - Operator notifications through the Telegram Bot API
//!
//! Provides:
//! - `TelegramNotifier`: `INotificationService` posting to `sendMessage`
//! - Message builders for alerts, success confirmations and cycle summaries

pub mod messages;
pub mod notifier;

pub use notifier::{TelegramNotifier, TELEGRAM_API_URL};

use thiserror::Error;

/// Errors raised while delivering a message
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The Bot API answered but refused the message (`ok: false`)
    #[error("Telegram API error: {0}")]
    Transport(String),

    #[error("Telegram returned HTTP {status}: {description}")]
    UnexpectedStatus { status: u16, description: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
