//! OAuth credential held by the check engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair with its expiry
///
/// [`Credential::default`] is the never-authenticated state: empty tokens and
/// no expiry.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for storage requests
    pub access_token: String,
    /// Token used to obtain a new access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires; `None` if never authenticated
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: Some(expires_at),
        }
    }

    /// Returns true if an expiry has ever been recorded
    pub fn is_authenticated(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Time left before expiry, negative once expired
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at - now)
    }

    /// Returns true if the token expires within `margin` of `now`
    ///
    /// A credential with no expiry is treated as already expired.
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        match self.time_remaining(now) {
            Some(remaining) => remaining <= margin,
            None => true,
        }
    }
}

// Tokens must never reach log output.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Upper bound applied to provider-reported token lifetimes (90 days)
const MAX_TOKEN_LIFETIME_SECS: i64 = 90 * 24 * 60 * 60;

/// Tokens issued by a refresh or a login
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// New refresh token, if the provider rotated it
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in_secs: u64,
}

impl TokenGrant {
    /// Turn the grant into a credential anchored at `now`
    ///
    /// When the provider did not rotate the refresh token, the previous one
    /// is kept.
    pub fn into_credential(
        self,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Credential {
        let secs = i64::try_from(self.expires_in_secs)
            .unwrap_or(MAX_TOKEN_LIFETIME_SECS)
            .min(MAX_TOKEN_LIFETIME_SECS);
        let lifetime = Duration::seconds(secs);
        Credential {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Some(now + lifetime),
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("rotated_refresh_token", &self.refresh_token.is_some())
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}
