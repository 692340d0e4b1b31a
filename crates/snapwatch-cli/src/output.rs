//! Command output
//!
//! Human mode prints check marks and aligned tables. JSON mode prints one
//! document per command on stdout, always wrapped in the same envelope:
//!
//! ```text
//! {"ok": true,  "message": "..."}     status-only commands
//! {"ok": true,  "data": {...}}        commands that return a value
//! {"ok": false, "error": "..."}       failures (stderr)
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use snapwatch_core::domain::BackupStatus;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    fn data(data: &'a T) -> Self {
        Self {
            ok: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }
}

impl<'a> Envelope<'a, ()> {
    fn message(message: &'a str) -> Self {
        Self {
            ok: true,
            message: Some(message),
            data: None,
            error: None,
        }
    }

    fn error(error: &'a str) -> Self {
        Self {
            ok: false,
            message: None,
            data: None,
            error: Some(error),
        }
    }
}

/// Writes command results in the selected format
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => print_document(&Envelope::message(message)),
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{2717} Error: {message}"),
            OutputFormat::Json => match serde_json::to_string(&Envelope::error(message)) {
                Ok(line) => eprintln!("{line}"),
                Err(_) => eprintln!("{message}"),
            },
        }
    }

    /// Human-only warning on stderr; JSON consumers get the data instead
    pub fn warn(&self, message: &str) {
        if !self.is_json() {
            eprintln!("\u{26a0} Warning: {message}");
        }
    }

    /// Indented detail line, human mode only
    pub fn info(&self, message: &str) {
        if !self.is_json() {
            println!("  {message}");
        }
    }

    /// Emits `data` as the command's JSON document; no-op in human mode
    pub fn emit<T: Serialize>(&self, data: &T) -> Result<()> {
        if self.is_json() {
            let doc = serde_json::to_string_pretty(&Envelope::data(data))
                .context("Failed to serialize command output")?;
            println!("{doc}");
        }
        Ok(())
    }

    /// Prints one row per client: name, state, fresh files, last backup
    pub fn status_table(&self, statuses: &[BackupStatus]) {
        if self.is_json() {
            return;
        }
        for line in status_rows(statuses) {
            println!("{line}");
        }
    }
}

fn print_document<T: Serialize>(doc: &T) {
    match serde_json::to_string(doc) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn state_label(status: &BackupStatus) -> &'static str {
    match (status.error(), status.is_fresh()) {
        (Some(_), _) => "ERROR",
        (None, true) => "OK",
        (None, false) => "STALE",
    }
}

fn status_rows(statuses: &[BackupStatus]) -> Vec<String> {
    let width = statuses
        .iter()
        .map(|s| s.client_name().chars().count())
        .chain(std::iter::once("CLIENT".len()))
        .max()
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(statuses.len() + 1);
    rows.push(format!(
        "{:<width$}  {:<6}  {:>5}  LAST BACKUP",
        "CLIENT", "STATE", "FRESH"
    ));
    for status in statuses {
        rows.push(format!(
            "{:<width$}  {:<6}  {:>5}  {}",
            status.client_name(),
            state_label(status),
            status.fresh_file_count(),
            status.last_backup_label(),
        ));
    }
    rows
}
