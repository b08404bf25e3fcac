//! Post-sync runner port

/// Port trait for running the configured post-sync actions
///
/// Implementations handle every failure internally; a broken action must
/// never affect the outcome of the sync run that triggered it.
#[async_trait::async_trait]
pub trait IPostSyncRunner: Send + Sync {
    async fn run_all(&self);
}
