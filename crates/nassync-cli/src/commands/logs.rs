//! Logs command - Show the sync history
//!
//! Lists the most recent sync log entries, newest first, either across
//! all mappings or for one mapping.

use anyhow::Result;
use clap::Args;
use nassync_core::domain::{MappingId, SyncLogEntry};
use nassync_core::ports::IConfigStore;

use super::AppContext;
use crate::output::{format_bytes, format_duration, get_formatter, to_json, truncate, OutputFormat};

/// Default number of entries shown
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Only show entries for this mapping
    #[arg(long)]
    pub mapping: Option<MappingId>,

    /// Maximum number of entries to show
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

impl LogsCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let entries = match self.mapping {
            Some(id) => ctx.store.mapping_sync_logs(id, self.limit).await?,
            None => ctx.store.recent_sync_logs(self.limit).await?,
        };

        if format.is_json() {
            formatter.print_json(&to_json(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            formatter.info("No sync history");
            return Ok(());
        }

        for entry in &entries {
            println!("{}", format_entry(entry));
        }
        Ok(())
    }
}

/// One history line: time, status mark, mapping, counts, duration, message
fn format_entry(entry: &SyncLogEntry) -> String {
    let mark = if entry.status.is_success() {
        "\u{2713}"
    } else {
        "\u{2717}"
    };
    let mapping = entry
        .mapping_name
        .clone()
        .unwrap_or_else(|| format!("#{}", entry.mapping_id));
    let duration = entry
        .duration_seconds
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {:<20} {:>5} files {:>10} {:>8}  {}",
        entry.completed_at.format("%Y-%m-%d %H:%M:%S"),
        mark,
        truncate(&mapping, 20),
        entry.files_transferred,
        format_bytes(entry.bytes_transferred),
        duration,
        entry.message.as_deref().unwrap_or(""),
    )
}
