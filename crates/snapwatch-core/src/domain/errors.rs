//! Domain error types
//!
//! This module defines the typed failures that flow through the check
//! engine: validation failures for domain values, failures reported by the
//! external collaborators, per-client check failures, and credential
//! failures.

use thiserror::Error;

/// Errors that can occur while constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid monitored path identifier
    #[error("Invalid monitored path: {0}")]
    InvalidMonitoredPath(String),
}

/// Failures reported by an external collaborator (storage or auth provider)
///
/// Adapters decode their wire-level failures into one of these variants so
/// the core never has to inspect HTTP status codes or provider payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The requested folder or item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The refresh token is no longer accepted by the identity provider
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// The request did not complete within its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network or server failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a payload that could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Reason a single client could not be evaluated
///
/// Carried by an errored [`BackupStatus`](super::BackupStatus); such a client
/// always counts as failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// The client folder has no sub-folder with the snapshot folder name
    #[error("{folder} folder not found. Available subfolders: [{}]", .available.join(", "))]
    SnapshotsFolderMissing {
        /// Expected snapshot folder name
        folder: String,
        /// Names of the sub-folders that were present
        available: Vec<String>,
    },

    /// Listing the client folder's sub-folders failed
    #[error("failed to list client subfolders: {0}")]
    SubfolderListing(ProviderError),

    /// Listing the snapshot files failed
    #[error("failed to list snapshot files: {0}")]
    FileListing(ProviderError),
}

/// Errors raised while making sure the credential is usable
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No expiry was ever recorded; the user has not logged in
    #[error("Not authenticated: no token expiry set, run `snapwatch auth login`")]
    NotAuthenticated,

    /// The credential is close to expiry but carries no refresh token
    #[error("No refresh token available, run `snapwatch auth login`")]
    MissingRefreshToken,

    /// The identity provider refused or failed the refresh
    #[error("Token refresh failed: {0}")]
    RefreshFailed(ProviderError),
}
