//! SQLite implementation of IConfigStore
//!
//! This module provides the concrete SQLite-based implementation of the
//! configuration store port defined in nassync-core. It handles all domain
//! type conversion and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type          | SQL Type | Strategy                                   |
//! |----------------------|----------|--------------------------------------------|
//! | MappingId, ActionId  | INTEGER  | `.get()` / `From<i64>`                     |
//! | bool                 | INTEGER  | 0 / 1                                      |
//! | u64 counters         | INTEGER  | Saturating cast to `i64`                   |
//! | PathBuf              | TEXT     | Lossy UTF-8 string                         |
//! | DateTime<Utc>        | TEXT     | RFC 3339 with microseconds, UTC `Z` suffix |
//! | SyncStatus           | TEXT     | `as_str()` / `FromStr`                     |
//! | ActionKind           | TEXT x2  | `action_type` name + JSON `config` object  |

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use nassync_core::domain::{
    ActionId, ActionKind, FolderMapping, MappingDraft, MappingId, NasEndpoint, NewSyncLog,
    PostSyncAction, SchedulerSetting, SyncLogEntry, SyncStatus,
};
use nassync_core::ports::IConfigStore;

use crate::StoreError;

/// SQLite-based implementation of the configuration store port
///
/// All operations are performed through a connection pool, so a single
/// instance can be shared between the engine, the scheduler and the CLI.
pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Format a timestamp for storage
///
/// Microsecond precision keeps entries written in the same second ordered.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a DateTime<Utc> from an RFC 3339 string or SQLite's default format
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Column defaults use CURRENT_TIMESTAMP, which has no timezone
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Parse an optional DateTime<Utc> from an optional string
fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    match s {
        Some(ref val) if !val.is_empty() => parse_datetime(val).map(Some),
        _ => Ok(None),
    }
}

/// Parse an optional status column
fn parse_optional_status(s: Option<String>) -> Result<Option<SyncStatus>, StoreError> {
    match s {
        Some(ref val) if !val.is_empty() => Ok(Some(val.parse()?)),
        _ => Ok(None),
    }
}

fn u64_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn u64_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// ============================================================================
// Row mapping functions
// ============================================================================

fn endpoint_from_row(row: &SqliteRow) -> Result<NasEndpoint, StoreError> {
    let hostname: String = row.get("hostname");
    let ssh_user: String = row.get("ssh_user");
    let ssh_key_path: String = row.get("ssh_key_path");
    let ssh_port: i64 = row.get("ssh_port");

    let ssh_port = u16::try_from(ssh_port).map_err(|_| {
        StoreError::SerializationError(format!("SSH port out of range: {}", ssh_port))
    })?;

    Ok(NasEndpoint::new(hostname, ssh_user)
        .with_key_path(PathBuf::from(ssh_key_path))
        .with_port(ssh_port))
}

fn mapping_from_row(row: &SqliteRow) -> Result<FolderMapping, StoreError> {
    let id: i64 = row.get("id");
    let last_sync_at: Option<String> = row.get("last_sync_at");
    let last_sync_status: Option<String> = row.get("last_sync_status");
    let created_at: Option<String> = row.get("created_at");

    Ok(FolderMapping {
        id: MappingId::from(id),
        name: row.get("name"),
        source_path: row.get("source_path"),
        destination_path: row.get("destination_path"),
        enabled: row.get("enabled"),
        delete_source: row.get("delete_source"),
        last_sync_at: parse_optional_datetime(last_sync_at)?,
        last_sync_status: parse_optional_status(last_sync_status)?,
        last_sync_message: row.get("last_sync_message"),
        created_at: parse_optional_datetime(created_at)?,
    })
}

fn sync_log_from_row(row: &SqliteRow) -> Result<SyncLogEntry, StoreError> {
    let id: i64 = row.get("id");
    let mapping_id: i64 = row.get("mapping_id");
    let status: String = row.get("status");
    let files: i64 = row.get("files_transferred");
    let bytes: i64 = row.get("bytes_transferred");
    let started_at: Option<String> = row.get("started_at");
    let completed_at: String = row.get("completed_at");

    Ok(SyncLogEntry {
        id,
        mapping_id: MappingId::from(mapping_id),
        mapping_name: row.get("mapping_name"),
        status: status.parse()?,
        message: row.get("message"),
        files_transferred: u64_from_sql(files),
        bytes_transferred: u64_from_sql(bytes),
        duration_seconds: row.get("duration_seconds"),
        started_at: parse_optional_datetime(started_at)?,
        completed_at: parse_datetime(&completed_at)?,
    })
}

fn action_from_row(row: &SqliteRow) -> Result<PostSyncAction, StoreError> {
    let id: i64 = row.get("id");
    let action_type: String = row.get("action_type");
    let config_str: String = row.get("config");

    let config: serde_json::Value = serde_json::from_str(&config_str).map_err(|e| {
        StoreError::SerializationError(format!(
            "Invalid config JSON for action {}: {}",
            id, e
        ))
    })?;

    Ok(PostSyncAction {
        id: ActionId::from(id),
        name: row.get("name"),
        kind: ActionKind::from_parts(&action_type, config)?,
        enabled: row.get("enabled"),
    })
}

const SYNC_LOG_SELECT: &str = "SELECT l.id, l.mapping_id, m.name AS mapping_name, l.status, \
     l.message, l.files_transferred, l.bytes_transferred, l.duration_seconds, \
     l.started_at, l.completed_at \
     FROM sync_logs l LEFT JOIN folder_mappings m ON m.id = l.mapping_id";

// ============================================================================
// IConfigStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IConfigStore for SqliteConfigStore {
    // --- Endpoint ---

    async fn get_endpoint(&self) -> anyhow::Result<Option<NasEndpoint>> {
        let row = sqlx::query(
            "SELECT hostname, ssh_user, ssh_key_path, ssh_port FROM nas_config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(endpoint_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn save_endpoint(&self, endpoint: &NasEndpoint) -> anyhow::Result<()> {
        let key_path = endpoint.ssh_key_path.to_string_lossy().to_string();
        let now = format_datetime(&Utc::now());

        sqlx::query(
            "INSERT INTO nas_config (id, hostname, ssh_user, ssh_key_path, ssh_port, created_at, updated_at) \
             VALUES (1, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             hostname = excluded.hostname, ssh_user = excluded.ssh_user, \
             ssh_key_path = excluded.ssh_key_path, ssh_port = excluded.ssh_port, \
             updated_at = excluded.updated_at",
        )
        .bind(&endpoint.hostname)
        .bind(&endpoint.ssh_user)
        .bind(&key_path)
        .bind(i64::from(endpoint.ssh_port))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(host = %endpoint.hostname, "Saved NAS endpoint");
        Ok(())
    }

    // --- Folder mappings ---

    async fn list_mappings(&self) -> anyhow::Result<Vec<FolderMapping>> {
        let rows = sqlx::query("SELECT * FROM folder_mappings ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        let mut mappings = Vec::with_capacity(rows.len());
        for row in &rows {
            mappings.push(mapping_from_row(row)?);
        }
        Ok(mappings)
    }

    async fn get_mapping(&self, id: MappingId) -> anyhow::Result<Option<FolderMapping>> {
        let row = sqlx::query("SELECT * FROM folder_mappings WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(mapping_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn create_mapping(&self, draft: &MappingDraft) -> anyhow::Result<MappingId> {
        draft.validate()?;

        let result = sqlx::query(
            "INSERT INTO folder_mappings \
             (name, source_path, destination_path, enabled, delete_source, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.name)
        .bind(&draft.source_path)
        .bind(&draft.destination_path)
        .bind(draft.enabled)
        .bind(draft.delete_source)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await?;

        let id = MappingId::from(result.last_insert_rowid());
        tracing::debug!(mapping_id = %id, name = %draft.name, "Created folder mapping");
        Ok(id)
    }

    async fn update_mapping(&self, id: MappingId, draft: &MappingDraft) -> anyhow::Result<bool> {
        draft.validate()?;

        let result = sqlx::query(
            "UPDATE folder_mappings SET name = ?, source_path = ?, destination_path = ?, \
             enabled = ?, delete_source = ? WHERE id = ?",
        )
        .bind(&draft.name)
        .bind(&draft.source_path)
        .bind(&draft.destination_path)
        .bind(draft.enabled)
        .bind(draft.delete_source)
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_mapping(&self, id: MappingId) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Explicit so the cascade holds on connections without foreign keys
        sqlx::query("DELETE FROM sync_logs WHERE mapping_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM folder_mappings WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!(mapping_id = %id, "Deleted folder mapping");
        }
        Ok(deleted)
    }

    async fn set_mapping_last_run(
        &self,
        id: MappingId,
        status: SyncStatus,
        message: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE folder_mappings SET last_sync_at = ?, last_sync_status = ?, \
             last_sync_message = ? WHERE id = ?",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(status.as_str())
        .bind(message)
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        tracing::trace!(mapping_id = %id, status = %status, "Recorded last run");
        Ok(())
    }

    // --- Sync log ---

    async fn append_sync_log(&self, entry: &NewSyncLog) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sync_logs \
             (mapping_id, status, message, files_transferred, bytes_transferred, \
              duration_seconds, started_at, completed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.mapping_id.get())
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(u64_to_sql(entry.stats.files_transferred))
        .bind(u64_to_sql(entry.stats.bytes_transferred))
        .bind(entry.duration_seconds)
        .bind(format_datetime(&entry.started_at))
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await?;

        tracing::trace!(mapping_id = %entry.mapping_id, status = %entry.status, "Appended sync log");
        Ok(())
    }

    async fn recent_sync_logs(&self, limit: u32) -> anyhow::Result<Vec<SyncLogEntry>> {
        let sql = format!(
            "{} ORDER BY l.completed_at DESC, l.id DESC LIMIT ?",
            SYNC_LOG_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(sync_log_from_row(row)?);
        }
        Ok(entries)
    }

    async fn mapping_sync_logs(
        &self,
        id: MappingId,
        limit: u32,
    ) -> anyhow::Result<Vec<SyncLogEntry>> {
        let sql = format!(
            "{} WHERE l.mapping_id = ? ORDER BY l.completed_at DESC, l.id DESC LIMIT ?",
            SYNC_LOG_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(id.get())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(sync_log_from_row(row)?);
        }
        Ok(entries)
    }

    // --- Scheduler ---

    async fn get_scheduler_setting(&self) -> anyhow::Result<SchedulerSetting> {
        let row = sqlx::query("SELECT enabled, interval_minutes FROM scheduler_config WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(SchedulerSetting::default());
        };

        let enabled: bool = row.get("enabled");
        let interval: i64 = row.get("interval_minutes");
        let interval = u32::try_from(interval.max(1)).unwrap_or(u32::MAX);

        Ok(SchedulerSetting::new(enabled, interval))
    }

    async fn save_scheduler_setting(&self, setting: &SchedulerSetting) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO scheduler_config (id, enabled, interval_minutes, updated_at) \
             VALUES (1, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET enabled = excluded.enabled, \
             interval_minutes = excluded.interval_minutes, updated_at = excluded.updated_at",
        )
        .bind(setting.enabled)
        .bind(i64::from(setting.interval_minutes))
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            enabled = setting.enabled,
            interval_minutes = setting.interval_minutes,
            "Saved scheduler setting"
        );
        Ok(())
    }

    // --- Post-sync actions ---

    async fn list_post_sync_actions(&self) -> anyhow::Result<Vec<PostSyncAction>> {
        let rows = sqlx::query(
            "SELECT id, name, action_type, config, enabled FROM post_sync_actions ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut actions = Vec::with_capacity(rows.len());
        for row in &rows {
            actions.push(action_from_row(row)?);
        }
        Ok(actions)
    }

    async fn create_post_sync_action(
        &self,
        name: &str,
        kind: &ActionKind,
    ) -> anyhow::Result<ActionId> {
        let config = serde_json::to_string(&kind.config_json())?;

        let result = sqlx::query(
            "INSERT INTO post_sync_actions (name, action_type, config, enabled, created_at) \
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(name)
        .bind(kind.type_name())
        .bind(&config)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await?;

        let id = ActionId::from(result.last_insert_rowid());
        tracing::debug!(action_id = %id, kind = kind.type_name(), "Created post-sync action");
        Ok(id)
    }

    async fn update_post_sync_action(
        &self,
        id: ActionId,
        name: &str,
        kind: &ActionKind,
        enabled: bool,
    ) -> anyhow::Result<bool> {
        let config = serde_json::to_string(&kind.config_json())?;

        let result = sqlx::query(
            "UPDATE post_sync_actions SET name = ?, action_type = ?, config = ?, enabled = ? \
             WHERE id = ?",
        )
        .bind(name)
        .bind(kind.type_name())
        .bind(&config)
        .bind(enabled)
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post_sync_action(&self, id: ActionId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM post_sync_actions WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_formats() {
        let rfc = parse_datetime("2026-03-01T10:00:00.123456Z").unwrap();
        assert_eq!(rfc.timestamp_subsec_micros(), 123_456);

        let sqlite = parse_datetime("2026-03-01 10:00:00").unwrap();
        assert_eq!(sqlite.to_rfc3339(), "2026-03-01T10:00:00+00:00");

        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_optional_helpers() {
        assert_eq!(parse_optional_datetime(None).unwrap(), None);
        assert_eq!(parse_optional_datetime(Some(String::new())).unwrap(), None);
        assert_eq!(
            parse_optional_status(Some("success".into())).unwrap(),
            Some(SyncStatus::Success)
        );
        assert!(parse_optional_status(Some("bogus".into())).is_err());
    }

    #[test]
    fn test_counter_casts_saturate() {
        assert_eq!(u64_to_sql(u64::MAX), i64::MAX);
        assert_eq!(u64_from_sql(-5), 0);
        assert_eq!(u64_from_sql(42), 42);
    }
}
