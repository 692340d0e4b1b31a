//! Check engine
//!
//! The [`CheckEngine`] runs one check cycle:
//!
//! 1. **Credential**: refresh the OAuth token if it expires within the margin
//!    and hand the access token to the storage provider
//! 2. **Targets**: run the [`TargetChecker`] over every monitored path in
//!    configuration order
//! 3. **Dispatch**: one alert per failed client, optional success
//!    confirmations, then exactly one summary
//!
//! ## Single flight
//!
//! The credential lives behind a `tokio::sync::Mutex` that doubles as the
//! cycle guard. Whoever holds the lock owns both the credential and the right
//! to talk to storage, so a manual check issued during a scheduled cycle waits
//! for it ([`run_cycle`](CheckEngine::run_cycle)) or is rejected
//! ([`try_run_cycle`](CheckEngine::try_run_cycle)). With a [`CycleLock`]
//! configured, a cycle running in another process makes either entry point
//! fail with [`MonitorError::CycleInProgress`].
//!
//! The cycle instant is read from the engine's clock after both locks are
//! held, never when the call is made.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use snapwatch_core::domain::{
    CheckCycleResult, Credential, CredentialError, MonitoredPath, ProviderError,
};
use snapwatch_core::ports::{
    BackupAlert, BackupSuccess, CycleSummary, IAuthProvider, ICredentialStore,
    INotificationService, IStorageProvider,
};
use snapwatch_core::usecases::{CredentialRefresher, TargetChecker, DEFAULT_SNAPSHOT_FOLDER};

use crate::lock::CycleLock;
use crate::MonitorError;

/// Source of the current instant
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Orchestrates check cycles over the configured monitored paths
pub struct CheckEngine {
    storage: Arc<dyn IStorageProvider>,
    notifier: Arc<dyn INotificationService>,
    store: Arc<dyn ICredentialStore>,
    refresher: CredentialRefresher,
    checker: TargetChecker,
    paths: Vec<MonitoredPath>,
    notify_success: bool,
    cycle_lock: Option<CycleLock>,
    clock: Clock,
    /// Current credential; holding this lock is holding the cycle guard
    credential: Mutex<Credential>,
}

impl CheckEngine {
    /// Creates an engine with no monitored paths and the default snapshot
    /// folder name
    pub fn new(
        storage: Arc<dyn IStorageProvider>,
        auth: Arc<dyn IAuthProvider>,
        store: Arc<dyn ICredentialStore>,
        notifier: Arc<dyn INotificationService>,
        credential: Credential,
    ) -> Self {
        Self {
            checker: TargetChecker::new(storage.clone(), DEFAULT_SNAPSHOT_FOLDER),
            refresher: CredentialRefresher::new(auth, store.clone()),
            storage,
            notifier,
            store,
            paths: Vec::new(),
            notify_success: false,
            cycle_lock: None,
            clock: Arc::new(Utc::now),
            credential: Mutex::new(credential),
        }
    }

    pub fn with_paths(mut self, paths: Vec<MonitoredPath>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_snapshot_folder(mut self, folder: impl Into<String>) -> Self {
        self.checker = TargetChecker::new(self.storage.clone(), folder);
        self
    }

    /// Also send a confirmation for every fresh client
    pub fn with_notify_success(mut self, enabled: bool) -> Self {
        self.notify_success = enabled;
        self
    }

    /// Also hold `lock` for the duration of every cycle
    pub fn with_cycle_lock(mut self, lock: CycleLock) -> Self {
        self.cycle_lock = Some(lock);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn paths(&self) -> &[MonitoredPath] {
        &self.paths
    }

    /// Snapshot of the current credential, waiting for any running cycle
    pub async fn credential(&self) -> Credential {
        self.credential.lock().await.clone()
    }

    /// Runs one cycle, waiting for an in-progress cycle to finish first
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Credential`] when the credential is missing or
    /// cannot be refreshed. No storage call or notification happens then.
    /// Returns [`MonitorError::CycleInProgress`] when another process holds
    /// the cycle lock.
    pub async fn run_cycle(&self) -> Result<CheckCycleResult, MonitorError> {
        let mut credential = self.credential.lock().await;
        self.run_locked(&mut credential).await
    }

    /// Runs one cycle unless another one holds the guard
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::CycleInProgress`] immediately when a cycle is
    /// already running, otherwise behaves like [`run_cycle`](Self::run_cycle).
    pub async fn try_run_cycle(&self) -> Result<CheckCycleResult, MonitorError> {
        let mut credential = self
            .credential
            .try_lock()
            .map_err(|_| MonitorError::CycleInProgress)?;
        self.run_locked(&mut credential).await
    }

    async fn run_locked(&self, credential: &mut Credential) -> Result<CheckCycleResult, MonitorError> {
        let _process_guard = match &self.cycle_lock {
            Some(lock) => match lock.try_acquire()? {
                Some(guard) => Some(guard),
                None => {
                    warn!(path = %lock.path().display(), "Cycle lock held by another process");
                    return Err(MonitorError::CycleInProgress);
                }
            },
            None => None,
        };

        let now = (self.clock)();
        let mut result = CheckCycleResult::new(now);
        let cycle_id = result.cycle_id;
        info!(%cycle_id, paths = self.paths.len(), "Check cycle started");

        let valid = match self.usable_credential(credential, now).await {
            Ok(valid) => valid,
            Err(e) => {
                error!(%cycle_id, error = %e, "Credential unusable, cycle aborted");
                return Err(e.into());
            }
        };
        *credential = valid;
        self.storage.set_access_token(&credential.access_token).await;

        for path in &self.paths {
            match self.checker.check(path, now).await {
                Ok(statuses) => {
                    debug!(%cycle_id, path = %path, clients = statuses.len(), "Path checked");
                    result.statuses.extend(statuses);
                }
                Err(e) => {
                    warn!(%cycle_id, path = %path, error = %e, "Failed to list clients, skipping path");
                    result.skipped_paths.push(path.clone());
                }
            }
        }

        self.dispatch(&result).await;

        info!(
            %cycle_id,
            total = result.total(),
            success = result.success_count(),
            failed = result.failed_count(),
            skipped_paths = result.skipped_paths.len(),
            "Check cycle completed"
        );
        Ok(result)
    }

    /// Makes the held credential valid, falling back to the credential store
    ///
    /// A login, logout or re-login done by another process is only visible
    /// through the store. It is consulted when the held credential cannot be
    /// used as is: never authenticated, no refresh token, or a refresh token
    /// the identity provider no longer accepts.
    async fn usable_credential(
        &self,
        held: &Credential,
        now: DateTime<Utc>,
    ) -> Result<Credential, CredentialError> {
        match self.refresher.ensure_valid(held, now).await {
            Err(e) if store_may_help(&e) => match self.stored_credential(held) {
                Some(stored) => {
                    info!(error = %e, "Retrying with the stored credential");
                    self.refresher.ensure_valid(&stored, now).await
                }
                None => Err(e),
            },
            other => other,
        }
    }

    /// The stored credential, if it differs from `held`
    fn stored_credential(&self, held: &Credential) -> Option<Credential> {
        match self.store.load() {
            Ok(Some(stored)) if stored != *held => Some(stored),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to reload stored credential");
                None
            }
        }
    }

    /// Sends alerts, optional successes, then the summary
    ///
    /// Delivery failures are logged and never stop later notifications.
    async fn dispatch(&self, result: &CheckCycleResult) {
        let cycle_id = result.cycle_id;

        for status in result.failed_statuses() {
            let alert = BackupAlert::from(status);
            if let Err(e) = self.notifier.send_alert(&alert).await {
                warn!(%cycle_id, client = %alert.client_name, error = %format!("{e:#}"), "Alert not delivered");
            }
        }

        if self.notify_success {
            for status in result.statuses.iter().filter(|s| s.is_success()) {
                let success = BackupSuccess::from(status);
                if let Err(e) = self.notifier.send_success(&success).await {
                    warn!(%cycle_id, client = %success.client_name, error = %format!("{e:#}"), "Success notice not delivered");
                }
            }
        }

        let summary = CycleSummary::from(result);
        if let Err(e) = self.notifier.send_summary(&summary).await {
            warn!(%cycle_id, error = %format!("{e:#}"), "Summary not delivered");
        }
    }
}

fn store_may_help(err: &CredentialError) -> bool {
    matches!(
        err,
        CredentialError::NotAuthenticated
            | CredentialError::MissingRefreshToken
            | CredentialError::RefreshFailed(ProviderError::InvalidGrant(_))
    )
}
