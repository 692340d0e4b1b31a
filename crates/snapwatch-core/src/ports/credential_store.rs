//! Credential persistence port
//!
//! Stores the [`Credential`] between runs. Implementations are synchronous;
//! secret stores such as the system keyring expose blocking APIs.

use crate::domain::Credential;

/// Port trait for loading and saving the OAuth credential
pub trait ICredentialStore: Send + Sync {
    /// Returns the stored credential, or `None` if nothing was saved yet
    fn load(&self) -> anyhow::Result<Option<Credential>>;

    /// Persists `credential`, replacing any previous value
    fn save(&self, credential: &Credential) -> anyhow::Result<()>;

    /// Removes the stored credential; a no-op if nothing is stored
    fn clear(&self) -> anyhow::Result<()>;
}
