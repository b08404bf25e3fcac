//! Folder mapping domain entity
//!
//! A folder mapping pairs a local source directory with a destination
//! directory on the NAS. The engine only ever touches its last-run fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::MappingId;

/// Outcome of one mapping run, as persisted on the mapping and in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The transfer tool reported success
    Success,
    /// The transfer failed or could not be started
    Error,
}

impl SyncStatus {
    /// Derives the status from a transfer's ok flag
    pub fn from_success(ok: bool) -> Self {
        if ok {
            SyncStatus::Success
        } else {
            SyncStatus::Error
        }
    }

    /// Lowercase storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncStatus::Success)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// A local folder mirrored to a destination on the NAS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderMapping {
    pub id: MappingId,
    /// Display name; mappings are enumerated ordered by it
    pub name: String,
    /// Local directory whose contents are transferred
    pub source_path: String,
    /// Directory on the NAS receiving the contents
    pub destination_path: String,
    /// Disabled mappings are skipped by whole-fleet runs
    pub enabled: bool,
    /// Remove source files once the transfer tool reports them transferred
    pub delete_source: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_status: Option<SyncStatus>,
    pub last_sync_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Editable fields of a mapping, used for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDraft {
    pub name: String,
    pub source_path: String,
    pub destination_path: String,
    pub enabled: bool,
    pub delete_source: bool,
}

impl MappingDraft {
    /// New enabled mapping that keeps its source files
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            enabled: true,
            delete_source: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn delete_source(mut self, delete_source: bool) -> Self {
        self.delete_source = delete_source;
        self
    }

    /// Rejects drafts with blank names or paths
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "mapping name must not be empty".into(),
            ));
        }
        if self.source_path.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "source path must not be empty".into(),
            ));
        }
        if self.destination_path.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "destination path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl From<&FolderMapping> for MappingDraft {
    fn from(mapping: &FolderMapping) -> Self {
        Self {
            name: mapping.name.clone(),
            source_path: mapping.source_path.clone(),
            destination_path: mapping.destination_path.clone(),
            enabled: mapping.enabled,
            delete_source: mapping.delete_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(SyncStatus::Success.as_str(), "success");
        assert_eq!("error".parse::<SyncStatus>().unwrap(), SyncStatus::Error);
        assert!(matches!(
            "pending".parse::<SyncStatus>(),
            Err(DomainError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_status_from_success() {
        assert!(SyncStatus::from_success(true).is_success());
        assert_eq!(SyncStatus::from_success(false), SyncStatus::Error);
    }

    #[test]
    fn test_draft_defaults() {
        let draft = MappingDraft::new("Photos", "/data/photos", "/volume1/photos");
        assert!(draft.enabled);
        assert!(!draft.delete_source);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_validation_rejects_blank_fields() {
        let draft = MappingDraft::new("  ", "/a", "/b");
        assert!(draft.validate().is_err());

        let draft = MappingDraft::new("x", "", "/b");
        assert!(draft.validate().is_err());

        let draft = MappingDraft::new("x", "/a", " ");
        assert!(draft.validate().is_err());
    }
}
