//! nassync Daemon - Background scheduling service
//!
//! This binary runs as a long-lived service (systemd unit or container
//! entrypoint) and handles:
//! - Interval-driven whole-fleet syncs to the NAS
//! - Scheduler reconfiguration on SIGHUP
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon opens the configuration store, wires the system adapters
//! into a [`SyncEngine`], and hands the engine to an
//! [`IntervalScheduler`]. The main loop only waits for signals; all sync
//! work happens on tasks owned by the scheduler. The loop is controlled
//! by a `CancellationToken` that is triggered on receipt of SIGTERM or
//! SIGINT.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use nassync_core::config::Config;
use nassync_store::{DatabasePool, SqliteConfigStore};
use nassync_sync::{IntervalScheduler, SyncEngine};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configuration file location
const CONFIG_ENV: &str = "NASSYNC_CONFIG";

/// How often shutdown checks whether an in-flight run has finished
const IDLE_POLL: Duration = Duration::from_millis(500);

// ============================================================================
// DaemonService
// ============================================================================

/// Owns the store, the engine and the scheduler for the process lifetime
struct DaemonService {
    engine: Arc<SyncEngine>,
    scheduler: IntervalScheduler,
    /// Token for signalling graceful shutdown
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the database and wires the adapters described by `config`
    async fn new(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        let db_pool = DatabasePool::new(&config.database.path)
            .await
            .context("Failed to open database")?;
        let store = Arc::new(SqliteConfigStore::new(db_pool.pool().clone()));

        let engine = Arc::new(nassync_sync::build_engine(config, store.clone()));
        let scheduler = IntervalScheduler::new(Arc::clone(&engine), store);

        Ok(Self {
            engine,
            scheduler,
            shutdown,
        })
    }

    /// Re-reads the scheduler setting; a store fault keeps the current job
    async fn reconfigure(&self) {
        match self.scheduler.configure().await {
            Ok(setting) => info!(
                enabled = setting.enabled,
                interval_minutes = setting.interval_minutes,
                "Scheduler configured"
            ),
            Err(e) => error!(error = %format!("{e:#}"), "Failed to read scheduler setting"),
        }
    }

    /// Runs until the shutdown token is cancelled
    ///
    /// 1. Installs the job from the saved setting and starts the timer
    /// 2. Reconfigures on every reload request
    /// 3. On shutdown, stops the timer and lets an in-flight run finish
    async fn run(&self, mut reload: mpsc::Receiver<()>) -> Result<()> {
        self.reconfigure().await;
        self.scheduler.start();

        let status = self.scheduler.status();
        info!(
            job_active = status.job_active,
            next_run = ?status.next_run_time,
            "Daemon ready"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
                Some(()) = reload.recv() => {
                    info!("Reload requested, re-reading scheduler setting");
                    self.reconfigure().await;
                }
            }
        }

        self.scheduler.stop();
        self.wait_for_idle().await;
        Ok(())
    }

    /// Runs are not cancellable, so shutdown waits for the current one
    async fn wait_for_idle(&self) {
        let state = self.engine.sync_status();
        if !state.in_progress {
            return;
        }

        warn!(
            mapping_id = ?state.current_mapping_id,
            "Sync in progress, waiting for it to finish before exiting"
        );
        while self.engine.sync_status().in_progress {
            tokio::time::sleep(IDLE_POLL).await;
        }
    }
}

// ============================================================================
// Signal handling
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

/// Forwards every SIGHUP as a reload request
#[cfg(unix)]
fn spawn_reload_listener() -> Result<mpsc::Receiver<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            // A pending request already covers this one
            let _ = tx.try_send(());
        }
    });

    Ok(rx)
}

#[cfg(not(unix))]
fn spawn_reload_listener() -> Result<mpsc::Receiver<()>> {
    let (_tx, rx) = mpsc::channel(1);
    Ok(rx)
}

// ============================================================================
// Main entry point
// ============================================================================

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path)
}

fn init_tracing(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path();
    let config = Config::load_or_default(&config_path);

    init_tracing(&config.logging.level);
    info!(config_path = %config_path.display(), "nassync daemon starting (nassyncd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!(field = %e.field, "{}", e.message);
        }
        anyhow::bail!("Invalid configuration in {}", config_path.display());
    }

    let shutdown_token = CancellationToken::new();

    // Spawn signal handler task
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });
    let reload = spawn_reload_listener()?;

    let service = DaemonService::new(&config, shutdown_token.clone()).await?;
    let result = service.run(reload).await;

    match &result {
        Ok(()) => info!("nassync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "nassync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use nassync_core::config::ConfigBuilder;

    use super::*;

    fn test_config(dir: &tempfile::TempDir) -> Config {
        ConfigBuilder::new()
            .database_path(dir.path().join("nassync.db"))
            .build()
    }

    #[tokio::test]
    async fn test_run_returns_after_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let service = DaemonService::new(&test_config(&dir), token.clone())
            .await
            .unwrap();

        let (_tx, rx) = mpsc::channel(1);
        token.cancel();
        service.run(rx).await.unwrap();

        let status = service.scheduler.status();
        assert!(!status.running);
        // Seeded default setting installs the job
        assert!(status.job_active);
    }

    #[tokio::test]
    async fn test_reload_request_reconfigures() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let service = Arc::new(
            DaemonService::new(&test_config(&dir), token.clone())
                .await
                .unwrap(),
        );

        let (tx, rx) = mpsc::channel(1);
        let runner = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run(rx).await })
        };

        // Disable the job through the store, then ask for a reload
        let pool = DatabasePool::new(&dir.path().join("nassync.db")).await.unwrap();
        disable_scheduler(&pool).await;
        tx.send(()).await.unwrap();

        for _ in 0..100 {
            if !service.scheduler.status().job_active {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!service.scheduler.status().job_active);

        token.cancel();
        runner.await.unwrap().unwrap();
    }

    async fn disable_scheduler(pool: &DatabasePool) {
        use nassync_core::domain::SchedulerSetting;
        use nassync_core::ports::IConfigStore;

        SqliteConfigStore::new(pool.pool().clone())
            .save_scheduler_setting(&SchedulerSetting::new(false, 15))
            .await
            .unwrap();
    }

    #[test]
    fn test_config_path_env_override() {
        std::env::set_var(CONFIG_ENV, "/tmp/nassync-test.yaml");
        assert_eq!(config_path(), PathBuf::from("/tmp/nassync-test.yaml"));
        std::env::remove_var(CONFIG_ENV);
    }
}
