//! Authentication provider port (driven/secondary port)
//!
//! Token-issuing collaborator. Interactive login happens through
//! [`IAuthProvider::authenticate`]; the check engine only ever calls
//! [`IAuthProvider::refresh`].

use crate::domain::{ProviderError, TokenGrant};

/// Port trait for OAuth token issuance
#[async_trait::async_trait]
pub trait IAuthProvider: Send + Sync {
    /// Runs the interactive login flow and returns the first token grant
    async fn authenticate(&self) -> Result<TokenGrant, ProviderError>;

    /// Exchanges a refresh token for a new access token
    ///
    /// # Errors
    /// `InvalidGrant` when the refresh token was revoked or expired,
    /// `Transport`/`Timeout` on network failures.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;
}
