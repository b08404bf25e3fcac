//! Sync orchestration engine
//!
//! The [`SyncEngine`] coordinates one run at a time across the whole
//! process: it checks the endpoint and its reachability, mirrors the
//! enabled folder mappings one after another, records every outcome and
//! fires the post-sync actions when something was transferred.
//!
//! ## Run Flow
//!
//! 1. **Gate**: claim the single-flight gate or return "already running"
//! 2. **Preconditions**: endpoint configured, NAS reachable, mappings enabled
//! 3. **Transfers**: sequential, each on its own task, each logged exactly once
//! 4. **Post-sync**: only when at least one mapping succeeded
//!
//! The gate is released by [`RunGuard`]'s `Drop`, so every exit path
//! (early return, store fault, panic) leaves the engine idle again.
//!
//! With [`SyncEngine::with_run_lock`] the gate also holds an exclusive
//! advisory lock on a file, which extends the single-flight guarantee to
//! every process sharing that file (the daemon and one-shot CLI runs).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use nassync_core::domain::{FolderMapping, MappingId, NasEndpoint, NewSyncLog, SyncStatus};
use nassync_core::ports::{
    IConfigStore, INetworkProbe, IPostSyncRunner, ITransferTool, TransferOutcome,
    DEFAULT_PROBE_TIMEOUT,
};

use crate::SyncError;

// ============================================================================
// Result types
// ============================================================================

/// Reason given when a run is requested while another is in flight
pub const REASON_ALREADY_RUNNING: &str = "Sync already running";
pub const REASON_NO_CONFIGURATION: &str = "No NAS configuration";
pub const REASON_NAS_OFFLINE: &str = "NAS is offline";
pub const REASON_NO_ENABLED_MAPPINGS: &str = "No enabled mappings";
pub const REASON_MAPPING_NOT_FOUND: &str = "Mapping not found";

/// Overall status of a run request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Skipped,
    Error,
}

/// Per-mapping line of a whole-fleet run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRunSummary {
    pub id: MappingId,
    pub name: String,
    pub success: bool,
}

/// Result of [`SyncEngine::run_all`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunAllResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub mappings: Vec<MappingRunSummary>,
    pub any_synced: bool,
}

impl RunAllResult {
    fn completed() -> Self {
        Self {
            status: RunStatus::Completed,
            reason: None,
            mappings: Vec::new(),
            any_synced: false,
        }
    }

    fn short_circuit(status: RunStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason.into()),
            mappings: Vec::new(),
            any_synced: false,
        }
    }
}

/// Result of [`SyncEngine::run_one`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOneResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RunOneResult {
    fn error(reason: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            mapping: None,
            success: None,
            reason: Some(reason.into()),
        }
    }
}

/// Snapshot returned by [`SyncEngine::sync_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub in_progress: bool,
    pub current_mapping_id: Option<MappingId>,
}

// ============================================================================
// Single-flight gate
// ============================================================================

#[derive(Debug, Default)]
struct RunGate {
    running: AtomicBool,
    current: Mutex<Option<MappingId>>,
    /// Shared with other processes; `None` keeps the gate process-local
    lock_path: Option<PathBuf>,
}

impl RunGate {
    fn with_lock_file(path: PathBuf) -> Self {
        Self {
            lock_path: Some(path),
            ..Self::default()
        }
    }

    /// Claims the gate
    ///
    /// `Ok(None)` means a run is already in flight, in this process or in
    /// another one holding the lock file.
    fn try_acquire(self: &Arc<Self>) -> Result<Option<RunGuard>, SyncError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }

        // Dropping the guard on any early return clears the flag again
        let mut guard = RunGuard {
            gate: Arc::clone(self),
            lock_file: None,
        };
        if let Some(path) = &self.lock_path {
            match lock_run_file(path)? {
                Some(file) => guard.lock_file = Some(file),
                None => return Ok(None),
            }
        }
        Ok(Some(guard))
    }

    fn set_current(&self, id: Option<MappingId>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    fn snapshot(&self) -> SyncState {
        SyncState {
            in_progress: self.running.load(Ordering::Acquire),
            current_mapping_id: *self.current.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Opens `path` and takes an exclusive lock without blocking
///
/// Returns `Ok(None)` when another open handle holds the lock. The lock is
/// released when the returned file is closed.
fn lock_run_file(path: &Path) -> Result<Option<File>, SyncError> {
    let lock_error = |source| SyncError::RunLock {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(lock_error)?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(file)),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
        Err(e) => Err(lock_error(e)),
    }
}

/// Proof of holding the gate; dropping it returns the engine to idle
struct RunGuard {
    gate: Arc<RunGate>,
    lock_file: Option<File>,
}

impl RunGuard {
    fn set_current(&self, id: Option<MappingId>) {
        self.gate.set_current(id);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.gate.set_current(None);
        drop(self.lock_file.take());
        self.gate.running.store(false, Ordering::Release);
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Orchestrates whole-fleet and single-mapping runs
pub struct SyncEngine {
    store: Arc<dyn IConfigStore>,
    probe: Arc<dyn INetworkProbe>,
    transfer: Arc<dyn ITransferTool>,
    post_sync: Arc<dyn IPostSyncRunner>,
    probe_timeout: Duration,
    gate: Arc<RunGate>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn IConfigStore>,
        probe: Arc<dyn INetworkProbe>,
        transfer: Arc<dyn ITransferTool>,
        post_sync: Arc<dyn IPostSyncRunner>,
    ) -> Self {
        Self {
            store,
            probe,
            transfer,
            post_sync,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            gate: Arc::new(RunGate::default()),
        }
    }

    /// Overrides the reachability probe bound
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Makes the single-flight gate exclusive across processes by locking
    /// `path` for the duration of every run
    pub fn with_run_lock(mut self, path: impl Into<PathBuf>) -> Self {
        self.gate = Arc::new(RunGate::with_lock_file(path.into()));
        self
    }

    /// Whether a run is in flight and which mapping it is transferring
    pub fn sync_status(&self) -> SyncState {
        self.gate.snapshot()
    }

    /// Runs [`run_all`](Self::run_all) on its own task
    pub fn spawn_run_all(self: &Arc<Self>) -> JoinHandle<RunAllResult> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_all().await })
    }

    /// Runs [`run_one`](Self::run_one) on its own task
    pub fn spawn_run_one(self: &Arc<Self>, id: MappingId) -> JoinHandle<RunOneResult> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_one(id).await })
    }

    /// Mirrors every enabled mapping, in store order
    #[tracing::instrument(skip(self))]
    pub async fn run_all(&self) -> RunAllResult {
        let guard = match self.gate.try_acquire() {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                info!("Sync already in progress, skipping");
                return RunAllResult::short_circuit(RunStatus::Skipped, REASON_ALREADY_RUNNING);
            }
            Err(e) => {
                error!(error = %e, "Failed to claim the run lock");
                return RunAllResult::short_circuit(RunStatus::Error, e.to_string());
            }
        };

        let endpoint = match self.load_endpoint().await {
            Ok(endpoint) => endpoint,
            Err(reason) => return RunAllResult::short_circuit(RunStatus::Error, reason),
        };

        if !self
            .probe
            .is_reachable(&endpoint.hostname, self.probe_timeout)
            .await
        {
            info!(host = %endpoint.hostname, "NAS is offline, skipping sync");
            return RunAllResult::short_circuit(RunStatus::Skipped, REASON_NAS_OFFLINE);
        }

        let mappings = match self.store.list_mappings().await {
            Ok(mappings) => mappings,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load folder mappings");
                return RunAllResult::short_circuit(
                    RunStatus::Error,
                    format!("Failed to load folder mappings: {e:#}"),
                );
            }
        };

        let enabled: Vec<FolderMapping> = mappings.into_iter().filter(|m| m.enabled).collect();
        if enabled.is_empty() {
            info!("No enabled mappings to sync");
            return RunAllResult::short_circuit(RunStatus::Skipped, REASON_NO_ENABLED_MAPPINGS);
        }

        let mut result = RunAllResult::completed();
        for mapping in &enabled {
            let outcome = self.sync_mapping(&guard, mapping, &endpoint).await;
            result.any_synced |= outcome.success;
            result.mappings.push(MappingRunSummary {
                id: mapping.id,
                name: mapping.name.clone(),
                success: outcome.success,
            });
        }

        if result.any_synced {
            self.post_sync.run_all().await;
        }

        info!(
            mappings = result.mappings.len(),
            any_synced = result.any_synced,
            "Sync run completed"
        );
        result
    }

    /// Mirrors exactly one mapping, whether or not it is enabled
    #[tracing::instrument(skip(self, id), fields(mapping_id = %id))]
    pub async fn run_one(&self, id: MappingId) -> RunOneResult {
        let guard = match self.gate.try_acquire() {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                info!("Sync already in progress, rejecting single run");
                return RunOneResult::error(REASON_ALREADY_RUNNING);
            }
            Err(e) => {
                error!(error = %e, "Failed to claim the run lock");
                return RunOneResult::error(e.to_string());
            }
        };

        let endpoint = match self.load_endpoint().await {
            Ok(endpoint) => endpoint,
            Err(reason) => return RunOneResult::error(reason),
        };

        if !self
            .probe
            .is_reachable(&endpoint.hostname, self.probe_timeout)
            .await
        {
            info!(host = %endpoint.hostname, "NAS is offline");
            return RunOneResult::error(REASON_NAS_OFFLINE);
        }

        let mapping = match self.store.get_mapping(id).await {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                warn!("Mapping not found");
                return RunOneResult::error(REASON_MAPPING_NOT_FOUND);
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load mapping");
                return RunOneResult::error(format!("Failed to load mapping: {e:#}"));
            }
        };

        let outcome = self.sync_mapping(&guard, &mapping, &endpoint).await;
        if outcome.success {
            self.post_sync.run_all().await;
        }

        RunOneResult {
            status: if outcome.success {
                RunStatus::Completed
            } else {
                RunStatus::Error
            },
            mapping: Some(mapping.name),
            success: Some(outcome.success),
            reason: (!outcome.success).then_some(outcome.message),
        }
    }

    /// Loads the endpoint, mapping absence and store faults to a reason
    async fn load_endpoint(&self) -> Result<NasEndpoint, String> {
        match self.store.get_endpoint().await {
            Ok(Some(endpoint)) => Ok(endpoint),
            Ok(None) => {
                warn!("No NAS configuration found");
                Err(REASON_NO_CONFIGURATION.to_string())
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load NAS configuration");
                Err(format!("Failed to load NAS configuration: {e:#}"))
            }
        }
    }

    /// Transfers one mapping and records the outcome on the mapping and in the log
    ///
    /// Never fails: faults and panics of the transfer adapter become an
    /// `error` outcome, and persistence faults are logged.
    async fn sync_mapping(
        &self,
        guard: &RunGuard,
        mapping: &FolderMapping,
        endpoint: &NasEndpoint,
    ) -> TransferOutcome {
        guard.set_current(Some(mapping.id));
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            mapping_id = %mapping.id,
            name = %mapping.name,
            source = %mapping.source_path,
            destination = %mapping.destination_path,
            "Starting mapping sync"
        );

        let transfer = Arc::clone(&self.transfer);
        let task_mapping = mapping.clone();
        let task_endpoint = endpoint.clone();
        let joined =
            tokio::spawn(async move { transfer.transfer(&task_mapping, &task_endpoint).await })
                .await;

        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(mapping_id = %mapping.id, error = %format!("{e:#}"), "Transfer fault");
                TransferOutcome::failure(format!("{e:#}"))
            }
            Err(e) => {
                let message = describe_join_error(e);
                error!(mapping_id = %mapping.id, error = %message, "Transfer task aborted");
                TransferOutcome::failure(message)
            }
        };

        let duration_seconds = clock.elapsed().as_secs_f64();
        let status = SyncStatus::from_success(outcome.success);

        if let Err(e) = self
            .store
            .set_mapping_last_run(mapping.id, status, &outcome.message)
            .await
        {
            warn!(mapping_id = %mapping.id, error = %format!("{e:#}"), "Failed to record last run");
        }

        let entry = NewSyncLog {
            mapping_id: mapping.id,
            status,
            message: outcome.message.clone(),
            stats: outcome.stats,
            duration_seconds,
            started_at,
        };
        if let Err(e) = self.store.append_sync_log(&entry).await {
            warn!(mapping_id = %mapping.id, error = %format!("{e:#}"), "Failed to append sync log");
        }

        info!(
            mapping_id = %mapping.id,
            status = %status,
            files = outcome.stats.files_transferred,
            bytes = outcome.stats.bytes_transferred,
            duration_seconds,
            "Mapping sync finished"
        );

        guard.set_current(None);
        outcome
    }
}

/// Turns a failed transfer task into a log-friendly message
fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return "Transfer task was cancelled".to_string();
    }

    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Transfer panicked: {}", detail)
}
