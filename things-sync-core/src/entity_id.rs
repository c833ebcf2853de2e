//! Entity identifiers compatible with Things Cloud.
//!
//! Locally generated ids are random UUIDs encoded with base58 and padded to a
//! fixed 22 characters. Ids that arrive from the server are treated as opaque:
//! older accounts carry hyphenated UUID strings, and those must round-trip
//! untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Length of a locally generated id.
pub const ID_LEN: usize = 22;

/// Errors that can occur with entity IDs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("Entity ID cannot be empty")]
    Empty,

    #[error("Entity ID contains whitespace: {0:?}")]
    Whitespace(String),
}

/// Identifier of one synchronized entity.
///
/// Assigned once at creation and never reassigned. Ordering is plain string
/// ordering and only exists so views can break ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new random entity ID
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let encoded = bs58::encode(uuid.as_bytes()).into_string();
        // '1' is the base58 zero digit, so left padding keeps the value intact.
        Self(format!("{:1>width$}", encoded, width = ID_LEN))
    }

    /// Parse an id received from the server or typed by a user.
    pub fn parse(s: &str) -> Result<Self, EntityIdError> {
        if s.is_empty() {
            return Err(EntityIdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EntityIdError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the underlying UUID, if this id was generated in the base58 form.
    pub fn as_uuid(&self) -> Option<Uuid> {
        let bytes = bs58::decode(&self.0).into_vec().ok()?;
        // Padding digits decode to leading zero bytes.
        let start = bytes.len().checked_sub(16)?;
        if bytes[..start].iter().any(|b| *b != 0) {
            return None;
        }
        Uuid::from_slice(&bytes[start..]).ok()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        let encoded = bs58::encode(uuid.as_bytes()).into_string();
        Self(format!("{:1>width$}", encoded, width = ID_LEN))
    }
}
