//! Work items and their five-type containment hierarchy.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{normalize, ParseEnumError};

/// The five kinds of work item, forming a strict containment hierarchy
/// (Epic → Story → Task/Bug → Subtask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Epic,
    Story,
    Task,
    Bug,
    Subtask,
}

impl IssueType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Story => "story",
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Subtask => "subtask",
        }
    }

    /// All five types, in hierarchy order.
    pub const ALL: [Self; 5] = [Self::Epic, Self::Story, Self::Task, Self::Bug, Self::Subtask];
}

/// All persisted fields for a work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    pub project_id: i64,
    pub team_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub issue_type: IssueType,
    pub parent_id: Option<i64>,
    pub status: String,
    pub code: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub reviewer: Option<String>,
    pub sprint: Option<String>,
    pub release: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Everything needed to create a new work item. The code and timestamps
/// are allocated by the service, never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub project_id: i64,
    pub team_id: Option<i64>,
    pub issue_type: IssueType,
    pub parent_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: Option<String>,
    pub assignee_id: Option<i64>,
    pub reviewer: Option<String>,
    pub sprint: Option<String>,
    pub release: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl IssueDraft {
    /// Minimal draft with required fields only.
    #[must_use]
    pub fn new(project_id: i64, team_id: Option<i64>, issue_type: IssueType, title: &str) -> Self {
        Self {
            project_id,
            team_id,
            issue_type,
            parent_id: None,
            title: title.to_string(),
            description: String::new(),
            status: "Open".to_string(),
            priority: None,
            assignee_id: None,
            reviewer: None,
            sprint: None,
            release: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// A partial update. `None` means "leave unchanged"; the nested options
/// on nullable columns distinguish "clear" from "leave alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub team_id: Option<Option<i64>>,
    pub assignee_id: Option<Option<i64>>,
    pub parent_id: Option<Option<i64>>,
    pub reviewer: Option<Option<String>>,
    pub sprint: Option<Option<String>>,
    pub release: Option<Option<String>>,
    pub start_date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
}

impl IssuePatch {
    /// `true` when the patch carries no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.team_id.is_none()
            && self.assignee_id.is_none()
            && self.parent_id.is_none()
            && self.reviewer.is_none()
            && self.sprint.is_none()
            && self.release.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// A compact row for parent pickers and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub issue_type: IssueType,
    pub status: String,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "epic" => Ok(Self::Epic),
            "story" => Ok(Self::Story),
            "task" => Ok(Self::Task),
            "bug" => Ok(Self::Bug),
            "subtask" => Ok(Self::Subtask),
            _ => Err(ParseEnumError {
                expected: "issue type",
                got: s.to_string(),
            }),
        }
    }
}
