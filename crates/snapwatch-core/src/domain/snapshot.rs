//! Storage listing records
//!
//! Typed records produced by the storage adapter. The core never sees raw
//! provider payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sub-folder of a monitored path; one per backup-producing client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFolder {
    /// Provider-specific folder identifier
    pub id: String,
    /// Display name (the client name)
    pub name: String,
}

impl ClientFolder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A file found inside a client's snapshot folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Provider-specific item identifier
    pub id: String,
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation timestamp as reported by the provider
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}
