//! Projects and teams as the core consumes them.
//!
//! The driver layer owns raw project/team CRUD; the core reads these rows
//! for permission facts, the project-active gate, and code allocation.

use serde::{Deserialize, Serialize};

/// A project: the unit of issue numbering and the active/inactive gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Configured issue-code prefix. May be empty, in which case the
    /// allocator falls back to the first two characters of the name.
    pub prefix: String,
    pub owner_id: Option<i64>,
    pub is_active: bool,
}

/// A team within exactly one project. Membership lives in the
/// `team_members` association table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub lead_id: Option<i64>,
}

impl Team {
    /// `true` when `user_id` is this team's designated lead.
    #[must_use]
    pub fn is_led_by(&self, user_id: i64) -> bool {
        self.lead_id == Some(user_id)
    }
}
