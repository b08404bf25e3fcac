//! Domain newtypes
//!
//! Store-assigned integer identifiers wrapped so a mapping id can never be
//! passed where an action id is expected.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Integer-backed ID types
// ============================================================================

/// Identifier for FolderMapping entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingId(i64);

impl MappingId {
    /// Wraps a raw store identifier
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw store identifier
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl Display for MappingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MappingId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid MappingId '{s}': {e}")))
    }
}

impl From<i64> for MappingId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Identifier for PostSyncAction entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(i64);

impl ActionId {
    /// Wraps a raw store identifier
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw store identifier
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl Display for ActionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid ActionId '{s}': {e}")))
    }
}

impl From<i64> for ActionId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_id_parse() {
        let id: MappingId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");

        let id: MappingId = " 7 ".parse().unwrap();
        assert_eq!(id, MappingId::new(7));
    }

    #[test]
    fn test_mapping_id_parse_invalid() {
        let result = "abc".parse::<MappingId>();
        assert!(matches!(result, Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn test_action_id_parse() {
        let id: ActionId = "3".parse().unwrap();
        assert_eq!(id, ActionId::from(3));
        assert!("".parse::<ActionId>().is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&MappingId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: ActionId = serde_json::from_str("9").unwrap();
        assert_eq!(back.get(), 9);
    }
}
