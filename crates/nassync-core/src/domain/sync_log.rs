//! Sync log domain entity
//!
//! One immutable record per mapping-run attempt. Entries are appended by
//! the engine and never updated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mapping::SyncStatus;
use super::newtypes::MappingId;

/// Byte and file counts extracted from the transfer tool's report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStats {
    pub files_transferred: u64,
    pub bytes_transferred: u64,
}

impl TransferStats {
    pub fn new(files_transferred: u64, bytes_transferred: u64) -> Self {
        Self {
            files_transferred,
            bytes_transferred,
        }
    }
}

/// A log entry about to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSyncLog {
    pub mapping_id: MappingId,
    pub status: SyncStatus,
    pub message: String,
    pub stats: TransferStats,
    pub duration_seconds: f64,
    pub started_at: DateTime<Utc>,
}

/// A persisted log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub mapping_id: MappingId,
    /// Populated by queries that join the mapping table
    pub mapping_name: Option<String>,
    pub status: SyncStatus,
    pub message: Option<String>,
    pub files_transferred: u64,
    pub bytes_transferred: u64,
    pub duration_seconds: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}
