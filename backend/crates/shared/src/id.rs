//! Entity Identifiers
//!
//! Players are addressed by the numeric ID the statistics API uses in its
//! paths (`/user/{id}/...`) and that profile links carry as `XID=<id>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker preceding the ID in profile links
const XID_MARKER: &str = "XID=";

/// Error when parsing an [`EntityId`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("Entity ID must not be zero")]
    Zero,

    #[error("No entity ID found in {0:?}")]
    NotFound(String),
}

/// Numeric player identifier
///
/// Usage:
/// ```
/// use kernel::id::EntityId;
///
/// let id: EntityId = "https://www.torn.com/profiles.php?XID=2531272".parse().unwrap();
/// assert_eq!(id.get(), 2531272);
/// assert_eq!("2531272".parse::<EntityId>().unwrap(), id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct EntityId(u64);

impl EntityId {
    /// Create from a raw value, rejecting zero
    pub fn new(value: u64) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::Zero);
        }
        Ok(Self(value))
    }

    /// Raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for EntityId {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl FromStr for EntityId {
    type Err = IdError;

    /// Accepts a bare number or any text containing `XID=<digits>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.find(XID_MARKER) {
            Some(pos) => {
                let rest = &trimmed[pos + XID_MARKER.len()..];
                let end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                &rest[..end]
            }
            None => trimmed,
        };

        let value = digits
            .parse::<u64>()
            .map_err(|_| IdError::NotFound(trimmed.to_string()))?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_number() {
        let id: EntityId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn test_parse_profile_link() {
        let id: EntityId = "https://www.torn.com/profiles.php?XID=1234&tab=x"
            .parse()
            .unwrap();
        assert_eq!(id.get(), 1234);
    }

    #[test]
    fn test_reject_zero_and_garbage() {
        assert_eq!("0".parse::<EntityId>(), Err(IdError::Zero));
        assert!(matches!(
            "profiles.php?XID=".parse::<EntityId>(),
            Err(IdError::NotFound(_))
        ));
        assert!(matches!(
            "not an id".parse::<EntityId>(),
            Err(IdError::NotFound(_))
        ));
    }

    #[test]
    fn test_serde_as_number() {
        let id = EntityId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let back: EntityId = serde_json::from_str("7").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<EntityId>("0").is_err());
    }
}
