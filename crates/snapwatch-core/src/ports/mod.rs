//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IStorageProvider`] - Folder and file listings on the remote drive
//! - [`IAuthProvider`] - OAuth login and token refresh
//! - [`ICredentialStore`] - Persistence of the OAuth credential
//! - [`INotificationService`] - Backup alerts and cycle summaries

pub mod auth_provider;
pub mod credential_store;
pub mod notification;
pub mod storage_provider;

pub use auth_provider::IAuthProvider;
pub use credential_store::ICredentialStore;
pub use notification::{BackupAlert, BackupSuccess, CycleSummary, INotificationService};
pub use storage_provider::IStorageProvider;
