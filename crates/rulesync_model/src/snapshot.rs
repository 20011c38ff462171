//! Snapshot of the elements a configuration unit last applied.

use crate::error::ModelResult;
use crate::ids::ParentKey;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};

/// The set of rules a unit believes it contributed to a shared parent.
///
/// The parent key travels with the rules so that observing or retracting a
/// unit needs nothing but its stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Shared parent the rules were applied to.
    pub parent_key: ParentKey,
    /// Rules the unit owns.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Snapshot {
    /// Creates a snapshot.
    pub fn new(parent_key: ParentKey, rules: Vec<Rule>) -> Self {
        Self { parent_key, rules }
    }

    /// Encodes the snapshot as a JSON string.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a snapshot. An empty (or blank) string means "no snapshot".
    pub fn from_json(state: &str) -> ModelResult<Option<Self>> {
        if state.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(state)?))
    }
}
