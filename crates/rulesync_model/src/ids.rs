//! Identifiers for shared parents and configuration units.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a shared parent object (the remote auto-tag's own id).
///
/// Every reconciliation against the same parent is serialized on this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParentKey(String);

impl ParentKey {
    /// Creates a parent key, rejecting empty or blank ids.
    pub fn new(key: impl Into<String>) -> ModelResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ModelError::invalid_identifier(
                "parent key",
                "must not be empty",
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParentKey {
    type Error = ModelError;

    fn try_from(key: String) -> ModelResult<Self> {
        Self::new(key)
    }
}

impl From<ParentKey> for String {
    fn from(key: ParentKey) -> Self {
        key.0
    }
}

impl fmt::Display for ParentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Caller-assigned id of a configuration unit.
///
/// Only used to address the unit's snapshot; never sent to the remote side.
/// Ids are restricted to ASCII letters, digits, `-`, `_` and `.` (not
/// leading), so every valid id is also a valid snapshot file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitId(String);

impl UnitId {
    /// Creates a unit id, rejecting empty ids and characters outside the
    /// allowed set.
    pub fn new(id: impl Into<String>) -> ModelResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::invalid_identifier("unit id", "must not be empty"));
        }
        if id.starts_with('.') {
            return Err(ModelError::invalid_identifier(
                "unit id",
                format!("{id:?} must not start with '.'"),
            ));
        }
        if let Some(c) = id.chars().find(|c| !is_unit_id_char(*c)) {
            return Err(ModelError::invalid_identifier(
                "unit id",
                format!("{id:?} contains {c:?}; allowed are ASCII letters, digits, '-', '_' and '.'"),
            ));
        }
        Ok(Self(id))
    }

    /// Mints a fresh random unit id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_unit_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl TryFrom<String> for UnitId {
    type Error = ModelError;

    fn try_from(id: String) -> ModelResult<Self> {
        Self::new(id)
    }
}

impl From<UnitId> for String {
    fn from(id: UnitId) -> Self {
        id.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
