//! In-memory collaborators shared by the engine and scheduler tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use snapwatch_core::domain::{
    ClientFolder, Credential, MonitoredPath, ProviderError, SnapshotFile, TokenGrant,
};
use snapwatch_core::ports::{
    BackupAlert, BackupSuccess, CycleSummary, IAuthProvider, ICredentialStore,
    INotificationService, IStorageProvider,
};
use snapwatch_monitor::CheckEngine;

// ----------------------------------------------------------------------------
// Storage
// ----------------------------------------------------------------------------

/// Drive keyed by folder id, with optional per-call latency
#[derive(Default)]
pub struct FakeDrive {
    folders: HashMap<String, Vec<ClientFolder>>,
    files: HashMap<String, Vec<SnapshotFile>>,
    failing: HashMap<String, ProviderError>,
    latency: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub tokens: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeDrive {
    pub fn folder(mut self, parent: &str, id: &str, name: &str) -> Self {
        self.folders
            .entry(parent.to_string())
            .or_default()
            .push(ClientFolder::new(id, name));
        self
    }

    pub fn file(mut self, parent: &str, name: &str, created_at: DateTime<Utc>) -> Self {
        self.files
            .entry(parent.to_string())
            .or_default()
            .push(SnapshotFile {
                id: format!("{parent}/{name}"),
                name: name.to_string(),
                size: 1024,
                created_at,
                modified_at: created_at,
            });
        self
    }

    /// Adds a client folder with a `snapshots` sub-folder
    pub fn client(self, parent: &str, name: &str) -> Self {
        let snapshots = format!("{name}-snapshots");
        self.folder(parent, name, name)
            .folder(name, &snapshots, "snapshots")
    }

    /// Adds a snapshot file to a client created with [`client`](Self::client)
    pub fn snapshot(self, client: &str, name: &str, created_at: DateTime<Utc>) -> Self {
        let snapshots = format!("{client}-snapshots");
        self.file(&snapshots, name, created_at)
    }

    pub fn failing(mut self, id: &str, err: ProviderError) -> Self {
        self.failing.insert(id.to_string(), err);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IStorageProvider for FakeDrive {
    async fn set_access_token(&self, token: &str) {
        self.tokens.lock().unwrap().push(token.to_string());
    }

    async fn list_subfolders(&self, folder_id: &str) -> Result<Vec<ClientFolder>, ProviderError> {
        self.enter(format!("folders:{folder_id}")).await;
        if let Some(err) = self.failing.get(folder_id) {
            return Err(err.clone());
        }
        Ok(self.folders.get(folder_id).cloned().unwrap_or_default())
    }

    async fn list_files(&self, folder_id: &str) -> Result<Vec<SnapshotFile>, ProviderError> {
        self.enter(format!("files:{folder_id}")).await;
        if let Some(err) = self.failing.get(folder_id) {
            return Err(err.clone());
        }
        Ok(self.files.get(folder_id).cloned().unwrap_or_default())
    }
}

// ----------------------------------------------------------------------------
// Auth and credential persistence
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAuth {
    pub refresh_calls: AtomicUsize,
    pub fail_with: Option<ProviderError>,
}

#[async_trait::async_trait]
impl IAuthProvider for FakeAuth {
    async fn authenticate(&self) -> Result<TokenGrant, ProviderError> {
        Err(ProviderError::Unauthorized("interactive login not available".into()))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(TokenGrant {
            access_token: "new-at".into(),
            refresh_token: Some("new-rt".into()),
            expires_in_secs: 3600,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub saved: Mutex<Option<Credential>>,
}

impl ICredentialStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Ok(self.saved.lock().unwrap().clone())
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        *self.saved.lock().unwrap() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.saved.lock().unwrap() = None;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Notifications
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Alert(BackupAlert),
    Success(BackupSuccess),
    Summary(CycleSummary),
    Text(String),
}

/// Records every notification; alerts can be made to fail
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_alerts: bool,
}

impl RecordingNotifier {
    pub fn failing_alerts() -> Self {
        Self {
            fail_alerts: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<CycleSummary> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Summary(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<BackupAlert> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Alert(alert) => Some(alert),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl INotificationService for RecordingNotifier {
    async fn send_alert(&self, alert: &BackupAlert) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Alert(alert.clone()));
        if self.fail_alerts {
            anyhow::bail!("chat not found");
        }
        Ok(())
    }

    async fn send_success(&self, success: &BackupSuccess) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Success(success.clone()));
        Ok(())
    }

    async fn send_summary(&self, summary: &CycleSummary) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Summary(summary.clone()));
        Ok(())
    }

    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Wiring
// ----------------------------------------------------------------------------

pub fn path(id: &str) -> MonitoredPath {
    MonitoredPath::new(id.to_string()).unwrap()
}

/// Credential expiring `minutes` after `now`
pub fn credential_expiring_in(now: DateTime<Utc>, minutes: i64) -> Credential {
    Credential::new(
        "old-at",
        Some("old-rt".to_string()),
        now + chrono::Duration::minutes(minutes),
    )
}

pub struct Harness {
    pub drive: Arc<FakeDrive>,
    pub auth: Arc<FakeAuth>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(drive: FakeDrive) -> Self {
        Self::with_parts(drive, FakeAuth::default(), RecordingNotifier::default())
    }

    pub fn with_parts(drive: FakeDrive, auth: FakeAuth, notifier: RecordingNotifier) -> Self {
        Self {
            drive: Arc::new(drive),
            auth: Arc::new(auth),
            store: Arc::new(MemoryStore::default()),
            notifier: Arc::new(notifier),
        }
    }

    pub fn engine(&self, credential: Credential, paths: &[&str]) -> CheckEngine {
        CheckEngine::new(
            self.drive.clone(),
            self.auth.clone(),
            self.store.clone(),
            self.notifier.clone(),
            credential,
        )
        .with_paths(paths.iter().map(|p| path(p)).collect())
    }

    /// Engine whose cycles are all evaluated at `now`
    pub fn engine_at(&self, now: DateTime<Utc>, credential: Credential, paths: &[&str]) -> CheckEngine {
        self.engine(credential, paths).with_clock(move || now)
    }
}
