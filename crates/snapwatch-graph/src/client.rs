//! Microsoft Graph API client
//!
//! Provides a typed HTTP client for the drive-item listing endpoints used by
//! SnapWatch. Handles authentication headers, pagination via
//! `@odata.nextLink`, 429 back-off and JSON decoding into [`DriveItem`].
//!
//! Back-off is bounded per listing: all `Retry-After` waits of one listing,
//! across every page, share a budget that defaults to the request timeout.
//! A wait that would overrun the budget fails the listing instead.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use snapwatch_graph::client::GraphClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = GraphClient::new("access-token-here", Duration::from_secs(30))?;
//! for item in client.list_root_children().await? {
//!     println!("{} ({})", item.name, item.id);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use snapwatch_core::domain::{ClientFolder, SnapshotFile};
use tracing::{debug, info, warn};

use crate::GraphError;

/// Base URL for Microsoft Graph API v1.0
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Properties requested for every listed drive item
const ITEM_SELECT: &str = "id,name,size,createdDateTime,lastModifiedDateTime,folder,file";

/// Default retry-after duration when header is missing (30 seconds)
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Longest Retry-After we are willing to honour (1 hour)
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Maximum number of retries for 429 responses
const DEFAULT_MAX_RETRIES: u32 = 3;

// ============================================================================
// Graph API response types
// ============================================================================

/// One page of a `children` listing
#[derive(Debug, Deserialize)]
struct DriveItemPage {
    value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// A drive item as returned by `/children`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    /// Size in bytes; folders report the aggregate size
    #[serde(default)]
    pub size: u64,
    pub created_date_time: Option<DateTime<Utc>>,
    pub last_modified_date_time: Option<DateTime<Utc>>,
    /// Present if the item is a folder
    pub folder: Option<FolderFacet>,
    /// Present if the item is a file
    pub file: Option<FileFacet>,
}

/// Folder facet
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: u64,
}

/// File facet
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    pub mime_type: Option<String>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    /// Converts a folder item into a [`ClientFolder`]
    pub fn into_client_folder(self) -> ClientFolder {
        ClientFolder::new(self.id, self.name)
    }

    /// Converts a file item into a [`SnapshotFile`]
    ///
    /// Falls back to the modification time when the creation time is missing.
    /// Returns `None` when the item carries neither timestamp.
    pub fn into_snapshot_file(self) -> Option<SnapshotFile> {
        let created_at = self.created_date_time.or(self.last_modified_date_time)?;
        let modified_at = self.last_modified_date_time.unwrap_or(created_at);
        Some(SnapshotFile {
            id: self.id,
            name: self.name,
            size: self.size,
            created_at,
            modified_at,
        })
    }
}

/// Error envelope returned by Graph on failures
#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    code: String,
    message: String,
}

// ============================================================================
// GraphClient
// ============================================================================

/// HTTP client for Microsoft Graph API calls
///
/// Wraps `reqwest::Client` with authentication headers and base URL
/// construction for the Microsoft Graph API. Every request is bounded by the
/// timeout given at construction.
pub struct GraphClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Current OAuth2 access token
    access_token: String,
    /// Retry budget for 429 responses, per request
    max_retries: u32,
    /// Total time one listing may spend honouring `Retry-After`
    max_backoff: Duration,
}

impl GraphClient {
    /// Creates a new GraphClient against the public Graph endpoint
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token for Microsoft Graph
    /// * `timeout` - Per-request timeout, also the default back-off budget
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self, GraphError> {
        Self::with_base_url(access_token, GRAPH_BASE_URL, timeout)
    }

    /// Creates a new GraphClient with a custom base URL (useful for testing)
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GraphError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            access_token: access_token.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            max_backoff: timeout,
        })
    }

    /// Overrides the 429 retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the total back-off budget of one listing
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated GraphClient access token");
    }

    /// Lists the children of the drive root
    pub async fn list_root_children(&self) -> Result<Vec<DriveItem>, GraphError> {
        self.list_children("/me/drive/root").await
    }

    /// Lists the children of the folder with the given item ID
    pub async fn list_folder_children(&self, item_id: &str) -> Result<Vec<DriveItem>, GraphError> {
        self.list_children(&format!("/me/drive/items/{item_id}"))
            .await
    }

    /// Lists every child of `item_path`, following `@odata.nextLink` pages
    async fn list_children(&self, item_path: &str) -> Result<Vec<DriveItem>, GraphError> {
        let mut url = format!(
            "{}{}/children?$select={}",
            self.base_url, item_path, ITEM_SELECT
        );
        let mut items = Vec::new();
        let mut pages = 0u32;
        let mut backoff_left = self.max_backoff;

        loop {
            let page: DriveItemPage = self.get_json(&url, &mut backoff_left).await?;
            pages += 1;
            items.extend(page.value);

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(path = item_path, items = items.len(), pages, "Listed children");
        Ok(items)
    }

    /// GETs an absolute URL and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        backoff_left: &mut Duration,
    ) -> Result<T, GraphError> {
        let response = self.execute_with_retry(url, backoff_left).await?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))
    }

    /// Executes a GET with automatic 429 retry.
    ///
    /// On HTTP 429 (Too Many Requests), parses the `Retry-After` header,
    /// sleeps, and retries up to the configured retry count. Each sleep is
    /// taken from `backoff_left`; a wait longer than what is left fails now.
    async fn execute_with_retry(
        &self,
        url: &str,
        backoff_left: &mut Duration,
    ) -> Result<Response, GraphError> {
        let mut retry_after = DEFAULT_RETRY_AFTER;

        for attempt in 0..=self.max_retries {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                if attempt > 0 {
                    info!(url, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                .unwrap_or(DEFAULT_RETRY_AFTER);

            if attempt == self.max_retries {
                break;
            }
            if retry_after > *backoff_left {
                warn!(
                    url,
                    retry_after_secs = retry_after.as_secs(),
                    backoff_left_secs = backoff_left.as_secs(),
                    "Retry-After exceeds back-off budget, giving up"
                );
                return Err(GraphError::TooManyRequests { retry_after });
            }
            *backoff_left -= retry_after;

            info!(
                url,
                attempt,
                retry_after_ms = retry_after.as_millis() as u64,
                "Received 429, backing off"
            );
            tokio::time::sleep(retry_after).await;
        }

        warn!(url, attempts = self.max_retries + 1, "429 retry limit exhausted");
        Err(GraphError::TooManyRequests { retry_after })
    }
}

/// Maps non-success statuses to [`GraphError`], keeping Graph's error message
async fn check_status(response: Response) -> Result<Response, GraphError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GraphErrorBody>(&body) {
        Ok(parsed) => format!("{}: {}", parsed.error.code, parsed.error.message),
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => body,
    };

    Err(match status {
        StatusCode::UNAUTHORIZED => GraphError::Unauthorized(message),
        StatusCode::FORBIDDEN => GraphError::Forbidden(message),
        StatusCode::NOT_FOUND => GraphError::NotFound(message),
        s if s.is_server_error() => GraphError::ServerError(message),
        s => GraphError::UnexpectedStatus {
            status: s.as_u16(),
            message,
        },
    })
}

/// Parses a Retry-After header value into a Duration.
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT"), converted to seconds from now
///
/// Values above one hour and unparseable values fall back to `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        let parsed = Duration::from_secs(seconds);
        if parsed <= MAX_RETRY_AFTER {
            return parsed;
        }
        warn!(value, "Retry-After exceeds one hour, using default");
        return default;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        let diff = date.with_timezone(&Utc) - Utc::now();
        if let Ok(parsed) = diff.to_std() {
            if parsed <= MAX_RETRY_AFTER {
                return parsed;
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
