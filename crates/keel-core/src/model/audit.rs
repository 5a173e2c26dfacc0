//! Audit entries: the append-only record of accepted mutations.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{normalize, ParseEnumError};

/// What a single audit row records. One row per accepted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
}

impl AuditAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// An immutable audit row. `changes` is one human-readable block with one
/// `field: old -> new` line per changed field; `change_count` equals the
/// number of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub issue_id: i64,
    /// Nulled when the acting user is later deleted (SET NULL).
    pub actor_id: Option<i64>,
    pub action: AuditAction,
    pub changes: String,
    pub change_count: u32,
    pub created_at: String,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            _ => Err(ParseEnumError {
                expected: "audit action",
                got: s.to_string(),
            }),
        }
    }
}
