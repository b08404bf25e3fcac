//! nassync Sync - Folder mirroring orchestration engine
//!
//! Provides:
//! - Reachability probing and SSH connection verification
//! - rsync invocation and report parsing
//! - Post-sync actions (media library refresh, webhooks)
//! - A single-flight sync orchestrator
//! - An interval scheduler driving unattended runs
//!
//! ## Modules
//!
//! - [`probe`] - `ping`/`ssh` adapter for the network probe port
//! - [`transfer`] - rsync adapter for the transfer tool port
//! - [`actions`] - HTTP adapter for the post-sync runner port
//! - [`engine`] - Sync orchestrator (`RunAll`, `RunOne`, status)
//! - [`scheduler`] - Reconfigurable interval scheduler

pub mod actions;
pub mod engine;
pub mod probe;
pub mod scheduler;
pub mod transfer;

pub use actions::{ActionOutcome, HttpPostSyncRunner};
pub use engine::{MappingRunSummary, RunAllResult, RunOneResult, RunStatus, SyncEngine, SyncState};
pub use probe::SystemProbe;
pub use scheduler::{IntervalScheduler, SchedulerStatus, SYNC_JOB_ID};
pub use transfer::{parse_transfer_output, RsyncTransfer};

use std::sync::Arc;

use thiserror::Error;

use nassync_core::config::Config;
use nassync_core::ports::IConfigStore;

/// Errors that can occur inside the sync adapters
///
/// None of these escape a run: the orchestrator and the post-sync runner
/// turn them into result values and log entries.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An external tool could not be started
    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool did not finish within its bound
    #[error("{tool} timed out after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    /// An HTTP call made by a post-sync action failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cross-process run lock could not be opened or taken
    #[error("Failed to lock {}: {source}", path.display())]
    RunLock {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Wires the system adapters described by `config` around `store`
///
/// Used by both binaries so the daemon and one-shot CLI runs behave alike.
pub fn build_engine(config: &Config, store: Arc<dyn IConfigStore>) -> SyncEngine {
    let probe = SystemProbe::new(&config.tools.ping, &config.tools.ssh);
    let transfer = RsyncTransfer::new(&config.tools.rsync, &config.tools.ssh);
    let post_sync = HttpPostSyncRunner::new(Arc::clone(&store), config.timeouts.http());

    SyncEngine::new(
        store,
        Arc::new(probe),
        Arc::new(transfer),
        Arc::new(post_sync),
    )
    .with_probe_timeout(config.timeouts.probe())
    .with_run_lock(config.database.run_lock_path())
}
