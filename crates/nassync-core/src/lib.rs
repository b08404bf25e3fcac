//! nassync Core - Domain types and port definitions
//!
//! This crate holds everything the sync engine and its adapters share:
//! - **Domain entities** - `NasEndpoint`, `FolderMapping`, `SyncLogEntry`,
//!   `SchedulerSetting`, `PostSyncAction`
//! - **Port definitions** - Traits for adapters: `IConfigStore`,
//!   `INetworkProbe`, `ITransferTool`, `IPostSyncRunner`
//! - **Configuration** - YAML-backed process configuration
//!
//! # Architecture
//!
//! The domain module is plain data with no I/O. Ports define the trait
//! interfaces the orchestrator in `nassync-sync` depends on; the SQLite
//! store and the external-tool adapters implement them.

pub mod config;
pub mod domain;
pub mod ports;
