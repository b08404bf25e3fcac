//! Transfer tool port
//!
//! Mirrors one folder mapping to the NAS. Byte-level transfer is delegated
//! to an external tool; the adapter only builds its invocation and reads
//! back its report.

use serde::{Deserialize, Serialize};

use crate::domain::{FolderMapping, NasEndpoint, TransferStats};

/// Tool-level result of transferring one mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub success: bool,
    /// Human-readable summary, or the tool's own error text
    pub message: String,
    /// Zeroed whenever `success` is false
    pub stats: TransferStats,
}

impl TransferOutcome {
    pub fn success(message: impl Into<String>, stats: TransferStats) -> Self {
        Self {
            success: true,
            message: message.into(),
            stats,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            stats: TransferStats::default(),
        }
    }
}

/// Port trait for the external mirroring tool
///
/// `Ok` covers every outcome the tool itself can produce, including a
/// non-zero exit or a failure to launch. `Err` is reserved for faults the
/// adapter did not anticipate; the engine records those as a failed run of
/// that mapping and moves on.
#[async_trait::async_trait]
pub trait ITransferTool: Send + Sync {
    async fn transfer(
        &self,
        mapping: &FolderMapping,
        endpoint: &NasEndpoint,
    ) -> anyhow::Result<TransferOutcome>;
}
