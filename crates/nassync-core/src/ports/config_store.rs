//! Configuration store port (driven/secondary port)
//!
//! Durable storage for the NAS endpoint, folder mappings, scheduler
//! setting, post-sync actions and the append-only sync log.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory fakes) and the engine never branches on them.
//! - Absence is modelled as `Ok(None)`, never as an error.
//! - `append_sync_log` is the only way log entries come into existence;
//!   individual entries are never updated or deleted.

use crate::domain::{
    ActionId, ActionKind, FolderMapping, MappingDraft, MappingId, NasEndpoint, NewSyncLog,
    PostSyncAction, SchedulerSetting, SyncLogEntry, SyncStatus,
};

/// Port trait for the configuration store
#[async_trait::async_trait]
pub trait IConfigStore: Send + Sync {
    // --- Endpoint ---

    /// Returns the configured NAS endpoint, if any
    async fn get_endpoint(&self) -> anyhow::Result<Option<NasEndpoint>>;

    /// Inserts or replaces the singleton endpoint
    async fn save_endpoint(&self, endpoint: &NasEndpoint) -> anyhow::Result<()>;

    // --- Folder mappings ---

    /// All mappings, ordered by name
    async fn list_mappings(&self) -> anyhow::Result<Vec<FolderMapping>>;

    /// Looks up a single mapping
    async fn get_mapping(&self, id: MappingId) -> anyhow::Result<Option<FolderMapping>>;

    /// Creates a mapping and returns its new identifier
    async fn create_mapping(&self, draft: &MappingDraft) -> anyhow::Result<MappingId>;

    /// Replaces the editable fields of a mapping
    ///
    /// Returns `false` when no mapping has that id.
    async fn update_mapping(&self, id: MappingId, draft: &MappingDraft) -> anyhow::Result<bool>;

    /// Deletes a mapping together with its log entries
    ///
    /// Returns `false` when no mapping has that id.
    async fn delete_mapping(&self, id: MappingId) -> anyhow::Result<bool>;

    /// Records the outcome of the latest run and stamps `last_sync_at`
    async fn set_mapping_last_run(
        &self,
        id: MappingId,
        status: SyncStatus,
        message: &str,
    ) -> anyhow::Result<()>;

    // --- Sync log ---

    /// Appends one immutable log entry
    async fn append_sync_log(&self, entry: &NewSyncLog) -> anyhow::Result<()>;

    /// Most recent entries across all mappings, newest first
    async fn recent_sync_logs(&self, limit: u32) -> anyhow::Result<Vec<SyncLogEntry>>;

    /// Most recent entries for one mapping, newest first
    async fn mapping_sync_logs(
        &self,
        id: MappingId,
        limit: u32,
    ) -> anyhow::Result<Vec<SyncLogEntry>>;

    // --- Scheduler ---

    /// The saved scheduler setting, or the default when none was saved
    async fn get_scheduler_setting(&self) -> anyhow::Result<SchedulerSetting>;

    async fn save_scheduler_setting(&self, setting: &SchedulerSetting) -> anyhow::Result<()>;

    // --- Post-sync actions ---

    /// All actions, enabled or not, ordered by name
    async fn list_post_sync_actions(&self) -> anyhow::Result<Vec<PostSyncAction>>;

    async fn create_post_sync_action(
        &self,
        name: &str,
        kind: &ActionKind,
    ) -> anyhow::Result<ActionId>;

    /// Returns `false` when no action has that id
    async fn update_post_sync_action(
        &self,
        id: ActionId,
        name: &str,
        kind: &ActionKind,
        enabled: bool,
    ) -> anyhow::Result<bool>;

    /// Returns `false` when no action has that id
    async fn delete_post_sync_action(&self, id: ActionId) -> anyhow::Result<bool>;
}
