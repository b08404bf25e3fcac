//! CLI subcommands
//!
//! Every command receives an [`AppContext`] holding the loaded process
//! configuration and an open configuration store.

pub mod action;
pub mod connection;
pub mod endpoint;
pub mod logs;
pub mod mapping;
pub mod scheduler;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use nassync_core::config::Config;
use nassync_core::domain::NasEndpoint;
use nassync_core::ports::IConfigStore;
use nassync_store::{DatabasePool, SqliteConfigStore};
use nassync_sync::{SyncEngine, SystemProbe};
use tracing::debug;

/// Configuration and storage shared by all subcommands
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteConfigStore>,
}

impl AppContext {
    /// Loads the configuration file; the default location may be absent
    pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
        match config_path {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(Config::load_or_default(&Config::default_path())),
        }
    }

    /// Opens the store named by `config`
    pub async fn with_config(config: Config) -> Result<Self> {
        debug!(database = %config.database.path.display(), "Opening configuration store");
        let pool = DatabasePool::new(&config.database.path)
            .await
            .context("Failed to open database")?;
        let store = Arc::new(SqliteConfigStore::new(pool.pool().clone()));
        Ok(Self { config, store })
    }

    /// Engine wired to the configured external tools
    pub fn engine(&self) -> SyncEngine {
        nassync_sync::build_engine(&self.config, self.store.clone())
    }

    pub fn probe(&self) -> SystemProbe {
        SystemProbe::new(&self.config.tools.ping, &self.config.tools.ssh)
    }

    /// The saved endpoint, or an error telling the user how to set one
    pub async fn require_endpoint(&self) -> Result<NasEndpoint> {
        self.store
            .get_endpoint()
            .await?
            .context("No NAS configuration. Run 'nassync endpoint set' first.")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use nassync_core::config::ConfigBuilder;

    use super::AppContext;

    /// Context backed by a fresh database inside `dir`
    pub async fn context(dir: &tempfile::TempDir) -> AppContext {
        let config = ConfigBuilder::new()
            .database_path(dir.path().join("nassync.db"))
            .build();
        AppContext::with_config(config).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let err = AppContext::load_config(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_explicit_config_level_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "logging:\n  level: debug\n").unwrap();
        let config = AppContext::load_config(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
