//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for identifiers that travel between the
//! configuration, the core and the storage adapter.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Identifier of a top-level storage folder selected for monitoring
///
/// For the Graph adapter this is a drive item ID such as
/// `"01BYE5RZ6QN3ZWBTUFOFD3GSPGOHDJD36K"`. The value is opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonitoredPath(String);

impl MonitoredPath {
    /// Create a new MonitoredPath
    ///
    /// # Errors
    /// Returns error if the identifier is empty or contains whitespace
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidMonitoredPath(
                "Monitored path cannot be empty".to_string(),
            ));
        }

        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidMonitoredPath(format!(
                "Monitored path contains whitespace: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MonitoredPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MonitoredPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for MonitoredPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MonitoredPath> for String {
    fn from(path: MonitoredPath) -> Self {
        path.0
    }
}
