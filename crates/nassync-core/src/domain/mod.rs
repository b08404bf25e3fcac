//! Domain entities
//!
//! This module contains the core domain types for nassync:
//! - Newtypes for store-assigned identifiers
//! - The NAS endpoint and folder mappings
//! - Sync log entries and transfer statistics
//! - The scheduler setting
//! - Post-sync actions
//! - Domain-specific error types

pub mod action;
pub mod endpoint;
pub mod errors;
pub mod mapping;
pub mod newtypes;
pub mod scheduler;
pub mod sync_log;

// Re-export commonly used types
pub use action::{ActionKind, LibraryRefreshConfig, PostSyncAction, WebhookConfig, WebhookMethod};
pub use endpoint::NasEndpoint;
pub use errors::DomainError;
pub use mapping::{FolderMapping, MappingDraft, SyncStatus};
pub use newtypes::{ActionId, MappingId};
pub use scheduler::SchedulerSetting;
pub use sync_log::{NewSyncLog, SyncLogEntry, TransferStats};
