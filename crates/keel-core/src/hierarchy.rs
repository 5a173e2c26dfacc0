//! Parent-child containment rules and cycle prevention.
//!
//! # Overview
//!
//! Work items form a forest: Epic → Story → Task/Bug → Subtask. This
//! module validates a proposed parent assignment against the type table
//! and rejects moves that would close a cycle.
//!
//! # Design
//!
//! Validation runs over a [`ParentIndex`] arena (id → parent, type)
//! loaded from the store, never over live rows. The ancestor walk keeps
//! an explicit visited set, so it terminates even when the stored chain
//! already contains corruption.
//!
//! A parent is optional for Story, Task, and Bug; forbidden for Epic;
//! mandatory for Subtask.

use std::collections::{HashMap, HashSet};

use crate::db::query::ParentRow;
use crate::error::CoreError;
use crate::model::issue::IssueType;

// ---------------------------------------------------------------------------
// Type-compatibility table
// ---------------------------------------------------------------------------

/// Parent types acceptable for `child`. Empty means a parent is
/// forbidden outright.
#[must_use]
pub const fn allowed_parent_types(child: IssueType) -> &'static [IssueType] {
    match child {
        IssueType::Epic => &[],
        IssueType::Story => &[IssueType::Epic],
        IssueType::Task => &[IssueType::Story],
        IssueType::Subtask => &[IssueType::Task],
        IssueType::Bug => &[IssueType::Story, IssueType::Task],
    }
}

/// `true` when `child` cannot exist without a parent.
#[must_use]
pub const fn parent_required(child: IssueType) -> bool {
    matches!(child, IssueType::Subtask)
}

// ---------------------------------------------------------------------------
// ParentIndex
// ---------------------------------------------------------------------------

/// An arena of (parent, type) entries keyed by issue id.
#[derive(Debug, Clone, Default)]
pub struct ParentIndex {
    entries: HashMap<i64, ParentRow>,
}

impl ParentIndex {
    #[must_use]
    pub fn from_rows(rows: Vec<ParentRow>) -> Self {
        let entries = rows.into_iter().map(|row| (row.id, row)).collect();
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&ParentRow> {
        self.entries.get(&id)
    }

    /// Ids in the subtree rooted at `root`, including `root` itself.
    /// A visited set guards against pre-existing cycles.
    #[must_use]
    pub fn subtree_ids(&self, root: i64) -> HashSet<i64> {
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in self.entries.values() {
            if let Some(parent) = row.parent_id {
                children.entry(parent).or_default().push(row.id);
            }
        }

        let mut visited: HashSet<i64> = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(kids) = children.get(&current) {
                stack.extend(kids.iter().copied());
            }
        }
        visited
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a proposed parent assignment.
///
/// `current_id` is the item being created or moved (`None` at creation
/// time, before an id exists). Checks, in order:
///
/// 1. absent parent: fine unless the type requires one
/// 2. parent exists in the index
/// 3. no self-parenting
/// 4. the candidate's ancestor chain never reaches `current_id`
/// 5. the parent's actual type is acceptable for `child_type`
///
/// # Errors
///
/// [`CoreError::InvalidParent`] for table violations and missing
/// parents; [`CoreError::CircularDependency`] for self-parenting and
/// ancestor cycles.
pub fn validate_parent(
    index: &ParentIndex,
    candidate_parent_id: Option<i64>,
    child_type: IssueType,
    current_id: Option<i64>,
) -> Result<(), CoreError> {
    let Some(parent_id) = candidate_parent_id else {
        if parent_required(child_type) {
            return Err(CoreError::InvalidParent(format!(
                "a {child_type} requires a parent"
            )));
        }
        return Ok(());
    };

    let allowed = allowed_parent_types(child_type);
    if allowed.is_empty() {
        return Err(CoreError::InvalidParent(format!(
            "a {child_type} cannot have a parent"
        )));
    }

    let Some(parent) = index.get(parent_id) else {
        return Err(CoreError::InvalidParent(format!(
            "parent issue {parent_id} does not exist in this project"
        )));
    };

    if let Some(current) = current_id {
        if parent_id == current {
            return Err(CoreError::CircularDependency(format!(
                "issue {current} cannot be its own parent"
            )));
        }

        // Walk from the candidate upward. The visited set guarantees
        // termination over already-corrupted chains.
        let mut visited: HashSet<i64> = HashSet::new();
        let mut cursor = Some(parent_id);
        while let Some(node) = cursor {
            if node == current {
                return Err(CoreError::CircularDependency(format!(
                    "issue {parent_id} is a descendant of issue {current}"
                )));
            }
            if !visited.insert(node) {
                tracing::warn!(node, "ancestor chain already contains a cycle");
                break;
            }
            cursor = index.get(node).and_then(|row| row.parent_id);
        }
    }

    if !allowed.contains(&parent.issue_type) {
        return Err(CoreError::InvalidParent(format!(
            "a {child_type} cannot be nested under a {}",
            parent.issue_type
        )));
    }

    Ok(())
}

/// Ids a parent picker may offer for `child_type` within one project:
/// type-compatible items, minus the moving item's own subtree.
#[must_use]
pub fn selectable_parent_ids(
    index: &ParentIndex,
    child_type: IssueType,
    exclude_id: Option<i64>,
) -> HashSet<i64> {
    let allowed = allowed_parent_types(child_type);
    let excluded = exclude_id.map(|id| index.subtree_ids(id));

    index
        .entries
        .values()
        .filter(|row| allowed.contains(&row.issue_type))
        .filter(|row| {
            excluded
                .as_ref()
                .is_none_or(|subtree| !subtree.contains(&row.id))
        })
        .map(|row| row.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
