//! Acting identities: roles, view modes, and the actor record.
//!
//! The core never creates or mutates identities; the driver layer seeds
//! them and the core only reads. `is_master_admin` is an explicit
//! provisioning-time flag, never derived by comparing against a
//! configuration constant at request time.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{normalize, ParseEnumError};

/// The four account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Developer,
    Tester,
    Other,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Developer => "developer",
            Self::Tester => "tester",
            Self::Other => "other",
        }
    }

    /// `Other` accounts may read but never mutate.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Other)
    }
}

/// The per-actor scope selector. A scope, not a privilege: it narrows
/// which projects a listing reaches, and never grants access the
/// permission predicate would deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Admin,
    Developer,
}

impl ViewMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Developer => "developer",
        }
    }
}

/// An authenticated identity as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub role: Role,
    view_mode: ViewMode,
    pub is_master_admin: bool,
}

impl Actor {
    #[must_use]
    pub const fn new(
        id: i64,
        username: String,
        role: Role,
        view_mode: ViewMode,
        is_master_admin: bool,
    ) -> Self {
        Self {
            id,
            username,
            role,
            view_mode,
            is_master_admin,
        }
    }

    /// The master admin always operates in admin mode; the stored column
    /// is ignored for that one identity.
    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        if self.is_master_admin {
            ViewMode::Admin
        } else {
            self.view_mode
        }
    }

    /// Unconditional administrative privilege: the master admin or any
    /// account with the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_master_admin || matches!(self.role, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "admin" => Ok(Self::Admin),
            "developer" => Ok(Self::Developer),
            "tester" => Ok(Self::Tester),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "role",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for ViewMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "admin" => Ok(Self::Admin),
            "developer" => Ok(Self::Developer),
            _ => Err(ParseEnumError {
                expected: "view mode",
                got: s.to_string(),
            }),
        }
    }
}
