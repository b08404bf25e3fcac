//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! sync engine. The engine depends on these interfaces; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IConfigStore`] - Endpoint, mappings, scheduler setting, actions, sync log
//! - [`INetworkProbe`] - Reachability probe and SSH connection test
//! - [`ITransferTool`] - External mirroring tool for one mapping
//! - [`IPostSyncRunner`] - Side effects fired after a run that transferred data

pub mod config_store;
pub mod network_probe;
pub mod post_sync;
pub mod transfer_tool;

pub use config_store::IConfigStore;
pub use network_probe::{
    ConnectionCheck, INetworkProbe, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROBE_TIMEOUT,
};
pub use post_sync::IPostSyncRunner;
pub use transfer_tool::{ITransferTool, TransferOutcome};
