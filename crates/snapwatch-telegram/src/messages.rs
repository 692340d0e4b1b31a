//! Message text for each notification kind
//!
//! Messages use Telegram's legacy `Markdown` parse mode. Every value that
//! comes from the drive or the config is escaped so client names such as
//! `web_01` do not break the entity parser.

use snapwatch_core::ports::{BackupAlert, BackupSuccess, CycleSummary};

/// Issue line used when the client was evaluated but nothing is fresh
pub const NO_BACKUP_TODAY: &str = "No backup found for today";

/// Longest text `sendMessage` accepts
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Room kept for the "…and N more" line while listing failed clients
const MORE_LINE_RESERVE: usize = 32;

/// Escapes the characters legacy Markdown treats as entity delimiters
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn alert_message(alert: &BackupAlert) -> String {
    let issue = alert.error.as_deref().unwrap_or(NO_BACKUP_TODAY);
    format!(
        "🚨 *Backup Alert*\n\n\
         *Client:* {}\n\
         *Folder:* {}\n\
         *Issue:* {}\n\
         *Last Backup:* {}\n\n\
         Please check the backup client immediately.",
        escape_markdown(&alert.client_name),
        escape_markdown(&alert.path),
        escape_markdown(issue),
        escape_markdown(&alert.last_backup),
    )
}

pub fn success_message(success: &BackupSuccess) -> String {
    format!(
        "✅ *Backup Success*\n\n\
         *Client:* {}\n\
         *Folder:* {}\n\
         *Files:* {} backup files found for today\n\n\
         All backups are up to date.",
        escape_markdown(&success.client_name),
        escape_markdown(&success.path),
        success.file_count,
    )
}

pub fn summary_message(summary: &CycleSummary) -> String {
    let status = if summary.all_good() {
        "✅ All Good"
    } else {
        "🚨 Issues Found"
    };

    let mut message = format!(
        "📊 *Daily Backup Report*\n\n\
         *Status:* {}\n\
         *Total Clients:* {}\n\
         *Successful:* {}\n\
         *Failed:* {}\n",
        status, summary.total, summary.success, summary.failed,
    );

    if !summary.failed_clients.is_empty() {
        message.push_str("\n*Failed Clients:*\n");
        push_client_list(&mut message, &summary.failed_clients);
    }

    message
}

/// Appends one bullet per client, cutting the list short with an
/// "…and N more" line once the message would pass [`MAX_MESSAGE_CHARS`]
fn push_client_list(message: &mut String, clients: &[String]) {
    let mut used = message.chars().count();
    for (i, client) in clients.iter().enumerate() {
        let line = format!("• {}\n", escape_markdown(client));
        let line_chars = line.chars().count();
        let reserve = if i + 1 < clients.len() {
            MORE_LINE_RESERVE
        } else {
            0
        };

        if used + line_chars + reserve > MAX_MESSAGE_CHARS {
            message.push_str(&format!("…and {} more\n", clients.len() - i));
            return;
        }
        message.push_str(&line);
        used += line_chars;
    }
}
