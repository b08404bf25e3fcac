//! Domain error types
//!
//! Errors raised while validating or decoding domain values: malformed ids,
//! unknown status strings, unknown post-sync action kinds.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A stored sync status that is neither `success` nor `error`
    #[error("Unknown sync status: {0}")]
    UnknownStatus(String),

    /// A post-sync action kind this build does not know how to execute
    #[error("Unknown post-sync action kind: {0}")]
    UnknownActionKind(String),

    /// Action configuration that does not match its kind
    #[error("Invalid action config for {kind}: {reason}")]
    InvalidActionConfig {
        /// The action kind being decoded
        kind: String,
        /// What was wrong with the config
        reason: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
