//! Use cases (application services)
//!
//! Use cases orchestrate domain logic through port interfaces:
//! - [`TargetChecker`] - Per-path client enumeration and freshness checks
//! - [`CredentialRefresher`] - Token refresh with a safety margin

pub mod check_target;
pub mod refresh_credential;

pub use check_target::{TargetChecker, DEFAULT_SNAPSHOT_FOLDER};
pub use refresh_credential::{CredentialRefresher, REFRESH_MARGIN_MINUTES};
