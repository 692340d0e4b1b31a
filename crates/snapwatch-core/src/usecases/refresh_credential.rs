//! Credential refresh use case
//!
//! Makes sure the access token outlives the coming check cycle. Tokens that
//! expire within [`REFRESH_MARGIN_MINUTES`] are refreshed through the auth
//! provider and the new credential is persisted right away.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    domain::{Credential, CredentialError},
    ports::{IAuthProvider, ICredentialStore},
};

/// Tokens expiring within this many minutes are refreshed before a cycle
pub const REFRESH_MARGIN_MINUTES: i64 = 10;

/// Use case keeping the OAuth credential usable
pub struct CredentialRefresher {
    auth: Arc<dyn IAuthProvider>,
    store: Arc<dyn ICredentialStore>,
    margin: Duration,
}

impl CredentialRefresher {
    /// Creates a refresher with the default 10 minute safety margin
    pub fn new(auth: Arc<dyn IAuthProvider>, store: Arc<dyn ICredentialStore>) -> Self {
        Self {
            auth,
            store,
            margin: Duration::minutes(REFRESH_MARGIN_MINUTES),
        }
    }

    pub fn margin(&self) -> Duration {
        self.margin
    }

    /// Returns a credential valid for at least the safety margin
    ///
    /// The input is returned unchanged, with no network call, when its expiry
    /// lies beyond the margin. Otherwise the refresh token is exchanged and
    /// the result persisted. A persistence failure is logged and does not
    /// fail the refresh.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotAuthenticated`] if no expiry was ever recorded
    /// - [`CredentialError::MissingRefreshToken`] if a refresh is due but no
    ///   refresh token is available
    /// - [`CredentialError::RefreshFailed`] if the auth provider fails
    pub async fn ensure_valid(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<Credential, CredentialError> {
        let Some(remaining) = credential.time_remaining(now) else {
            return Err(CredentialError::NotAuthenticated);
        };

        if !credential.expires_within(self.margin, now) {
            debug!(
                remaining_secs = remaining.num_seconds(),
                "Access token still valid, skipping refresh"
            );
            return Ok(credential.clone());
        }

        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(CredentialError::MissingRefreshToken)?;

        info!(
            remaining_secs = remaining.num_seconds(),
            "Access token expiring, refreshing"
        );

        let grant = self
            .auth
            .refresh(refresh_token)
            .await
            .map_err(CredentialError::RefreshFailed)?;

        let refreshed = grant.into_credential(credential.refresh_token.clone(), now);

        if let Err(e) = self.store.save(&refreshed) {
            warn!(error = %e, "Failed to persist refreshed credential");
        }

        info!(expires_at = ?refreshed.expires_at, "Access token refreshed");
        Ok(refreshed)
    }
}
