//! Configuration module for SnapWatch.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, saving, validation, defaults, and a builder pattern for
//! programmatic use. OAuth tokens are not part of this file; they live in the
//! credential store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, MonitoredPath};
use crate::usecases::DEFAULT_SNAPSHOT_FOLDER;

/// Public client ID of the Microsoft Office desktop application, which is
/// pre-authorised for the Graph `Files.Read.All` scope in every tenant.
pub const DEFAULT_CLIENT_ID: &str = "d3590ed6-52b3-4102-aeff-aad2292ab01c";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for SnapWatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
    pub telegram: TelegramConfig,
    pub auth: AuthConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

/// Which remote folders are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Drive item IDs of the top-level folders holding one sub-folder per client.
    pub monitor_paths: Vec<String>,
    /// Name of the per-client folder containing snapshot files.
    pub snapshot_folder: String,
}

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// When false the service mode exits without running any cycle.
    pub enabled: bool,
    /// Minutes between the end of one cycle and the start of the next.
    pub check_interval_minutes: u64,
    /// Also send a message for every client with a fresh snapshot.
    pub notify_success: bool,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather. `None` until configured.
    pub bot_token: Option<String>,
    /// Chat receiving the notifications.
    pub chat_id: Option<i64>,
}

/// OAuth settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Azure AD application (client) ID used for the device code flow.
    pub client_id: String,
    /// Tenant segment of the authority URL: `common`, `organizations`,
    /// `consumers` or a tenant ID.
    pub tenant: String,
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds for storage, auth and Telegram calls.
    pub request_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load() / save()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration to `path` as YAML, creating parent directories.
    ///
    /// On Unix the file is restricted to the owner since it holds the bot token.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let yaml = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/snapwatch/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("snapwatch")
            .join("config.yaml")
    }

    /// Lock file shared by the daemon and `snapwatch check`.
    ///
    /// Independent of the config file location so every process agrees on
    /// it. Typically `$XDG_CACHE_HOME/snapwatch/cycle.lock` on Linux.
    pub fn cycle_lock_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("snapwatch")
            .join("cycle.lock")
    }

    /// Monitored paths as validated domain values.
    pub fn monitored_paths(&self) -> Result<Vec<MonitoredPath>, DomainError> {
        self.storage
            .monitor_paths
            .iter()
            .cloned()
            .map(MonitoredPath::new)
            .collect()
    }

    /// True once the Telegram bot and at least one monitored path are set.
    pub fn is_configured(&self) -> bool {
        self.telegram
            .bot_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
            && self.telegram.chat_id.is_some()
            && !self.storage.monitor_paths.is_empty()
    }

    /// Per-request timeout for every outbound call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    /// Wait between two scheduled cycles.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.check_interval_minutes.saturating_mul(60))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            monitor_paths: Vec::new(),
            snapshot_folder: DEFAULT_SNAPSHOT_FOLDER.to_string(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_minutes: 60,
            notify_success: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            tenant: "common".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"monitoring.check_interval_minutes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
pub const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Missing Telegram
    /// settings are not validation errors; see [`Config::is_configured`].
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- storage ---
        for (index, raw) in self.storage.monitor_paths.iter().enumerate() {
            if let Err(e) = MonitoredPath::new(raw.clone()) {
                errors.push(ValidationError {
                    field: format!("storage.monitor_paths[{index}]"),
                    message: e.to_string(),
                });
            }
        }
        let trimmed = self.storage.snapshot_folder.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            errors.push(ValidationError {
                field: "storage.snapshot_folder".into(),
                message: "must be a non-empty folder name without '/'".into(),
            });
        }

        // --- monitoring ---
        if self.monitoring.check_interval_minutes == 0 {
            errors.push(ValidationError {
                field: "monitoring.check_interval_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- telegram ---
        if let Some(token) = &self.telegram.bot_token {
            if !token.contains(':') {
                errors.push(ValidationError {
                    field: "telegram.bot_token".into(),
                    message: "expected the '<bot id>:<secret>' format issued by BotFather"
                        .into(),
                });
            }
        }

        // --- auth ---
        if self.auth.client_id.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.client_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.auth.tenant.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.tenant".into(),
                message: "must not be empty".into(),
            });
        }

        // --- network ---
        if self.network.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "network.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

/// Mask a secret for display: first and last four characters around `****`.
///
/// Secrets of eight characters or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use snapwatch_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .monitor_path("01BYE5RZ6QN3ZWBTUFOFD3GSPGOHDJD36K")
///     .check_interval_minutes(30)
///     .telegram("123456:ABC-DEF", -100123)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- storage ---

    pub fn monitor_path(mut self, id: impl Into<String>) -> Self {
        self.config.storage.monitor_paths.push(id.into());
        self
    }

    pub fn snapshot_folder(mut self, name: impl Into<String>) -> Self {
        self.config.storage.snapshot_folder = name.into();
        self
    }

    // --- monitoring ---

    pub fn monitoring_enabled(mut self, enabled: bool) -> Self {
        self.config.monitoring.enabled = enabled;
        self
    }

    pub fn check_interval_minutes(mut self, minutes: u64) -> Self {
        self.config.monitoring.check_interval_minutes = minutes;
        self
    }

    pub fn notify_success(mut self, notify: bool) -> Self {
        self.config.monitoring.notify_success = notify;
        self
    }

    // --- telegram ---

    pub fn telegram(mut self, bot_token: impl Into<String>, chat_id: i64) -> Self {
        self.config.telegram.bot_token = Some(bot_token.into());
        self.config.telegram.chat_id = Some(chat_id);
        self
    }

    // --- auth ---

    pub fn auth_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.auth.client_id = client_id.into();
        self
    }

    pub fn auth_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.config.auth.tenant = tenant.into();
        self
    }

    // --- network ---

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.network.request_timeout_secs = secs;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.storage.monitor_paths.is_empty());
        assert_eq!(cfg.storage.snapshot_folder, "snapshots");
        assert!(cfg.monitoring.enabled);
        assert_eq!(cfg.monitoring.check_interval_minutes, 60);
        assert!(!cfg.monitoring.notify_success);
        assert!(cfg.telegram.bot_token.is_none());
        assert!(cfg.telegram.chat_id.is_none());
        assert_eq!(cfg.auth.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(cfg.auth.tenant, "common");
        assert_eq!(cfg.network.request_timeout_secs, 30);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn durations_derive_from_config() {
        let cfg = ConfigBuilder::new()
            .check_interval_minutes(15)
            .request_timeout_secs(10)
            .build();
        assert_eq!(cfg.check_interval(), Duration::from_secs(900));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn cycle_lock_path_is_under_snapwatch_dir() {
        let path = Config::cycle_lock_path();
        assert!(path.ends_with("snapwatch/cycle.lock"));
    }

    #[test]
    fn default_config_is_not_configured() {
        assert!(!Config::default().is_configured());
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
storage:
  monitor_paths:
    - 01BYE5RZ6QN3ZWBTUFOFD3GSPGOHDJD36K
    - 01BYE5RZ2NXP4OOLS7ABCDEFGHIJKLMNOP
  snapshot_folder: restic-snapshots
monitoring:
  enabled: false
  check_interval_minutes: 15
  notify_success: true
telegram:
  bot_token: "123456:ABC-DEF1234ghIkl"
  chat_id: -1001234567890
auth:
  client_id: my-app
  tenant: consumers
network:
  request_timeout_secs: 10
logging:
  level: debug
  format: json
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.storage.monitor_paths.len(), 2);
        assert_eq!(cfg.storage.snapshot_folder, "restic-snapshots");
        assert!(!cfg.monitoring.enabled);
        assert_eq!(cfg.monitoring.check_interval_minutes, 15);
        assert!(cfg.monitoring.notify_success);
        assert_eq!(
            cfg.telegram.bot_token.as_deref(),
            Some("123456:ABC-DEF1234ghIkl")
        );
        assert_eq!(cfg.telegram.chat_id, Some(-1001234567890));
        assert_eq!(cfg.auth.client_id, "my-app");
        assert_eq!(cfg.auth.tenant, "consumers");
        assert_eq!(cfg.network.request_timeout_secs, 10);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "json");
        assert!(cfg.is_configured());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let yaml = "monitoring:\n  check_interval_minutes: 5\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.monitoring.check_interval_minutes, 5);
        assert!(cfg.monitoring.enabled);
        assert_eq!(cfg.storage.snapshot_folder, "snapshots");
        assert_eq!(cfg.network.request_timeout_secs, 30);
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Saving --

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("config.yaml");

        let cfg = ConfigBuilder::new()
            .monitor_path("ROOT1")
            .telegram("42:secret", 99)
            .notify_success(true)
            .build();
        cfg.save(&path).expect("save config");

        let loaded = Config::load(&path).expect("load config");
        assert_eq!(loaded, cfg);
    }

    #[cfg(unix)]
    #[test]
    fn save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.yaml");
        Config::default().save(&path).expect("save config");

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_interval_and_timeout() {
        let mut cfg = Config::default();
        cfg.monitoring.check_interval_minutes = 0;
        cfg.network.request_timeout_secs = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"monitoring.check_interval_minutes".to_string()));
        assert!(fields.contains(&"network.request_timeout_secs".to_string()));
    }

    #[test]
    fn validate_catches_blank_monitor_path() {
        let cfg = ConfigBuilder::new()
            .monitor_path("GOOD")
            .monitor_path("  ")
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "storage.monitor_paths[1]");
    }

    #[test]
    fn validate_catches_bad_snapshot_folder() {
        let cfg = ConfigBuilder::new().snapshot_folder("a/b").build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "storage.snapshot_folder"));
    }

    #[test]
    fn validate_catches_malformed_bot_token() {
        let cfg = ConfigBuilder::new().telegram("no-colon", 1).build();
        assert!(cfg.validate().iter().any(|e| e.field == "telegram.bot_token"));
    }

    #[test]
    fn validate_catches_invalid_logging() {
        let cfg = ConfigBuilder::new()
            .logging_level("verbose")
            .logging_format("xml")
            .build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
        assert!(errors.iter().any(|e| e.field == "logging.format"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "logging.level".into(),
            message: "bad".into(),
        };
        assert_eq!(err.to_string(), "logging.level: bad");
    }

    // -- Helpers --

    #[test]
    fn is_configured_requires_bot_chat_and_path() {
        let cfg = ConfigBuilder::new().telegram("1:x", 5).build();
        assert!(!cfg.is_configured());

        let cfg = ConfigBuilder::new()
            .telegram("1:x", 5)
            .monitor_path("ROOT")
            .build();
        assert!(cfg.is_configured());
    }

    #[test]
    fn monitored_paths_are_typed() {
        let cfg = ConfigBuilder::new().monitor_path("A").monitor_path("B").build();
        let paths = cfg.monitored_paths().unwrap();
        assert_eq!(paths[0].as_str(), "A");
        assert_eq!(paths[1].as_str(), "B");
    }

    #[test]
    fn mask_secret_keeps_edges() {
        assert_eq!(mask_secret("123456:ABCDEFGHIJ"), "1234****GHIJ");
        assert_eq!(mask_secret("12345678"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn build_validated_rejects_invalid() {
        let result = ConfigBuilder::new().check_interval_minutes(0).build_validated();
        assert!(result.is_err());
    }
}
