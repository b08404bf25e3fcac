//! nassync Store - Configuration store persistence
//!
//! SQLite-backed storage for:
//! - The NAS endpoint
//! - Folder mappings and their last-run status
//! - The append-only sync log
//! - The scheduler setting
//! - Post-sync actions
//!
//! ## Architecture
//!
//! This crate implements the `IConfigStore` port from `nassync-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteConfigStore`] - Full `IConfigStore` implementation
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use nassync_store::{DatabasePool, SqliteConfigStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/config/nas_sync.db")).await?;
//! let store = SqliteConfigStore::new(pool.pool().clone());
//! // Use store as IConfigStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteConfigStore;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}

impl From<nassync_core::domain::DomainError> for StoreError {
    fn from(e: nassync_core::domain::DomainError) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}
