//! OAuth2 device code flow for Microsoft Graph API
//!
//! SnapWatch runs on headless backup hosts, so login uses the device
//! authorization grant (RFC 8628): the user opens a verification URL on any
//! device and types a short code while this process polls the token endpoint.
//!
//! ## Components
//!
//! - [`DeviceCodeConfig`] - Client ID, tenant and scopes
//! - [`DeviceCodeFlow`] - Device code request, polling and token refresh
//! - [`GraphAuthAdapter`] - `IAuthProvider` implementation
//! - [`KeyringCredentialStore`] - `ICredentialStore` backed by the system keyring

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use oauth2::{
    basic::{BasicClient, BasicErrorResponseType},
    ClientId, DeviceAuthorizationUrl, EndpointNotSet, EndpointSet, ErrorResponse, RefreshToken,
    RequestTokenError, Scope, StandardDeviceAuthorizationResponse, TokenResponse, TokenUrl,
};
use snapwatch_core::domain::{Credential, ProviderError, TokenGrant};
use snapwatch_core::ports::{IAuthProvider, ICredentialStore};
use tracing::{debug, info, warn};

/// Microsoft identity platform authority
pub const AUTHORITY_URL: &str = "https://login.microsoftonline.com";

/// Keyring service name for storing the credential
const KEYRING_SERVICE: &str = "snapwatch";

/// Keyring user name; a single credential is stored per OS user
const KEYRING_USER: &str = "default";

/// Read-only drive access plus a refresh token
const DEFAULT_SCOPES: &[&str] = &["https://graph.microsoft.com/Files.Read.All", "offline_access"];

/// Token lifetime assumed when the provider omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

// ============================================================================
// DeviceCodeConfig
// ============================================================================

/// Configuration for the OAuth2 device code flow
#[derive(Debug, Clone)]
pub struct DeviceCodeConfig {
    /// Application (client) ID
    pub client_id: String,
    /// Tenant segment of the authority URL (`common`, `organizations`, ...)
    pub tenant: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authority base URL, overridable for tests
    pub authority: String,
    /// Timeout for each token endpoint call
    pub request_timeout: Duration,
}

impl DeviceCodeConfig {
    /// Creates a config with the default scopes and authority
    pub fn new(client_id: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            tenant: tenant.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            authority: AUTHORITY_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Points the flow at a different authority (e.g. a mock server)
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn device_code_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/devicecode",
            self.authority.trim_end_matches('/'),
            self.tenant
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant
        )
    }
}

// ============================================================================
// DeviceCodeFlow
// ============================================================================

/// What the user must do to approve the login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCodePrompt {
    pub verification_uri: String,
    pub user_code: String,
    /// How long the code stays valid
    pub expires_in: Duration,
}

/// OAuth2 device code flow implementation using the `oauth2` crate
pub struct DeviceCodeFlow {
    client: BasicClient<EndpointNotSet, EndpointSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    http: reqwest::Client,
    scopes: Vec<String>,
}

impl DeviceCodeFlow {
    /// Creates a new DeviceCodeFlow with the given configuration
    pub fn new(config: &DeviceCodeConfig) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_device_authorization_url(
                DeviceAuthorizationUrl::new(config.device_code_url())
                    .context("Invalid device authorization URL")?,
            )
            .set_token_uri(TokenUrl::new(config.token_url()).context("Invalid token URL")?);

        // Redirects are disabled to avoid leaking codes to third parties.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            client,
            http,
            scopes: config.scopes.clone(),
        })
    }

    /// Requests a device code and user code
    pub async fn start(&self) -> Result<StandardDeviceAuthorizationResponse, ProviderError> {
        let mut request = self.client.exchange_device_code();
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let details: StandardDeviceAuthorizationResponse = request
            .request_async(&self.http)
            .await
            .map_err(token_error)?;

        debug!(
            verification_uri = %details.verification_uri().as_str(),
            "Received device code"
        );
        Ok(details)
    }

    /// Polls the token endpoint until the user approves, declines, or the
    /// code expires
    pub async fn poll(
        &self,
        details: &StandardDeviceAuthorizationResponse,
    ) -> Result<TokenGrant, ProviderError> {
        let token = self
            .client
            .exchange_device_access_token(details)
            .request_async(&self.http, tokio::time::sleep, None)
            .await
            .map_err(token_error)?;

        info!("Device code approved");
        Ok(grant_from(&token))
    }

    /// Exchanges a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        info!("Refreshing access token");

        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|err| match err {
                RequestTokenError::ServerResponse(resp)
                    if *resp.error() == BasicErrorResponseType::InvalidGrant =>
                {
                    ProviderError::InvalidGrant(
                        resp.error_description()
                            .cloned()
                            .unwrap_or_else(|| resp.to_string()),
                    )
                }
                other => token_error(other),
            })?;

        Ok(grant_from(&token))
    }
}

fn grant_from(token: &impl TokenResponse) -> TokenGrant {
    TokenGrant {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|t| t.secret().to_string()),
        expires_in_secs: token
            .expires_in()
            .map(|d| d.as_secs())
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS),
    }
}

/// Maps an `oauth2` request failure onto [`ProviderError`]
fn token_error<HE, T>(err: RequestTokenError<HE, T>) -> ProviderError
where
    HE: std::error::Error + 'static,
    T: ErrorResponse + 'static,
{
    match err {
        RequestTokenError::ServerResponse(resp) => ProviderError::Unauthorized(resp.to_string()),
        RequestTokenError::Request(e) => ProviderError::Transport(e.to_string()),
        RequestTokenError::Parse(e, _) => ProviderError::InvalidResponse(e.to_string()),
        RequestTokenError::Other(msg) => ProviderError::Transport(msg),
    }
}

// ============================================================================
// GraphAuthAdapter
// ============================================================================

/// Callback showing the device code to the user
pub type PromptFn = Arc<dyn Fn(&DeviceCodePrompt) + Send + Sync>;

/// `IAuthProvider` for Microsoft identity
///
/// `authenticate` hands the device code to the prompt callback, tries to open
/// the verification page in a browser, then waits for approval.
pub struct GraphAuthAdapter {
    flow: DeviceCodeFlow,
    prompt: PromptFn,
    open_browser: bool,
}

impl GraphAuthAdapter {
    /// Creates an adapter that logs the device code prompt
    pub fn new(config: &DeviceCodeConfig) -> anyhow::Result<Self> {
        Ok(Self {
            flow: DeviceCodeFlow::new(config)?,
            prompt: Arc::new(|prompt: &DeviceCodePrompt| {
                info!(
                    verification_uri = %prompt.verification_uri,
                    user_code = %prompt.user_code,
                    "Sign in to authorize SnapWatch"
                );
            }),
            open_browser: false,
        })
    }

    /// Replaces the prompt callback
    pub fn with_prompt(mut self, prompt: PromptFn) -> Self {
        self.prompt = prompt;
        self
    }

    /// Also try to open the verification URL in the default browser
    pub fn with_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }
}

#[async_trait::async_trait]
impl IAuthProvider for GraphAuthAdapter {
    async fn authenticate(&self) -> Result<TokenGrant, ProviderError> {
        info!("Starting OAuth2 device code login flow");

        let details = self.flow.start().await?;
        let prompt = DeviceCodePrompt {
            verification_uri: details.verification_uri().as_str().to_string(),
            user_code: details.user_code().secret().to_string(),
            expires_in: details.expires_in(),
        };
        (self.prompt)(&prompt);

        if self.open_browser {
            if let Err(e) = webbrowser::open(&prompt.verification_uri) {
                warn!(error = %e, "Failed to open browser, continue manually");
            }
        }

        self.flow.poll(&details).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        self.flow.refresh(refresh_token).await
    }
}

// ============================================================================
// KeyringCredentialStore
// ============================================================================

/// Stores the credential in the system keyring
///
/// Uses the `keyring` crate to store the credential securely in the OS
/// credential store (e.g., GNOME Keyring, KDE Wallet, macOS Keychain),
/// serialized as JSON under the service name "snapwatch".
pub struct KeyringCredentialStore {
    service: String,
    user: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: KEYRING_USER.to_string(),
        }
    }

    /// Uses a different keyring user, e.g. one per configuration profile
    pub fn with_user(user: impl Into<String>) -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            user: user.into(),
        }
    }

    fn entry(&self) -> anyhow::Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ICredentialStore for KeyringCredentialStore {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let credential: Credential = serde_json::from_str(&json)
                    .context("Failed to deserialize credential from keyring")?;
                debug!(user = %self.user, "Loaded credential from keyring");
                Ok(Some(credential))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(user = %self.user, "No credential found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        let json = serde_json::to_string(credential).context("Failed to serialize credential")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store credential in keyring")?;
        debug!(user = %self.user, "Stored credential in keyring");
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                info!(user = %self.user, "Cleared credential from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(user = %self.user, "No credential to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}
