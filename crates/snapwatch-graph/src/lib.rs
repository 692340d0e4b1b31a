//! SnapWatch Graph - Microsoft Graph adapters
//!
//! Provides the OneDrive-backed implementations of the core ports:
//! - [`provider::GraphStorageProvider`] - folder and snapshot listings
//! - [`auth::GraphAuthAdapter`] - OAuth2 device code login and token refresh
//! - [`auth::KeyringCredentialStore`] - credential persistence in the system keyring
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 device code flow and keyring storage
//! - [`client`] - Microsoft Graph API HTTP client
//! - [`provider`] - `IStorageProvider` implementation

pub mod auth;
pub mod client;
pub mod provider;

use std::time::Duration;

use snapwatch_core::domain::ProviderError;
use thiserror::Error;

/// Errors that can occur when communicating with the Microsoft Graph API
#[derive(Debug, Error)]
pub enum GraphError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit still exceeded after the retry budget was spent
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration the server last asked us to wait
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other unexpected HTTP status
    #[error("HTTP {status}: {message}")]
    UnexpectedStatus {
        /// Response status code
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GraphError> for ProviderError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NotFound(msg) => ProviderError::NotFound(msg),
            GraphError::Unauthorized(msg) | GraphError::Forbidden(msg) => {
                ProviderError::Unauthorized(msg)
            }
            GraphError::NetworkError(e) if e.is_timeout() => ProviderError::Timeout(e.to_string()),
            GraphError::NetworkError(e) if e.is_decode() => {
                ProviderError::InvalidResponse(e.to_string())
            }
            GraphError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
            other => ProviderError::Transport(other.to_string()),
        }
    }
}
