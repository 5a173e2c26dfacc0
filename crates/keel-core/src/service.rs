//! The issue mutation service: sequences access control, hierarchy
//! validation, code allocation, workflow gating, and the audit trail
//! around every create/update/delete.
//!
//! # Check order
//!
//! Fixed and uniform across entry points: existence → project-active
//! gate → permission → hierarchy/workflow validation → write → diff →
//! audit → notify. Every mutation runs inside one SQLite transaction;
//! an error anywhere rolls the whole transaction back, so the audit
//! trail never records a failed mutation.
//!
//! # Code allocation races
//!
//! Mutations open IMMEDIATE transactions, so concurrent writers
//! serialize on the store's write lock (waiting out the busy timeout)
//! and the code scan always runs against committed state. The `UNIQUE`
//! constraint on `issues.code` backs that up: if an insert still lands
//! on a taken code, the scan-and-insert is retried here and the
//! conflict is never surfaced to callers.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::access::{self, Action, CreateFacts, IssueFacts};
use crate::audit::{DiffBuilder, FieldKind};
use crate::codes;
use crate::db::query;
use crate::error::{CoreError, CoreResult, Missing};
use crate::hierarchy::{self, ParentIndex};
use crate::model::actor::{Actor, ViewMode};
use crate::model::audit::AuditEntry;
use crate::model::issue::{IssueDraft, IssuePatch, IssueSummary, IssueType, WorkItem};
use crate::notify::{notify_best_effort, NotificationSink};
use crate::workflow;

/// Bounded retries for the code-allocation conflict loop.
const MAX_CODE_ATTEMPTS: u32 = 5;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a work item.
///
/// # Errors
///
/// `NotFound` for a missing project/team/assignee, `ProjectInactive`,
/// `PermissionDenied`, `InvalidParent`/`CircularDependency` from the
/// hierarchy table, or a store failure.
pub fn create_issue(
    conn: &mut Connection,
    sink: &dyn NotificationSink,
    actor: &Actor,
    draft: &IssueDraft,
) -> CoreResult<WorkItem> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Existence first, then the active gate, then permission.
    let project =
        query::get_project(&tx, draft.project_id)?.ok_or(CoreError::NotFound(Missing::Project))?;
    if !project.is_active {
        return Err(CoreError::ProjectInactive);
    }

    let mut facts = CreateFacts {
        team_named: draft.team_id.is_some(),
        ..CreateFacts::default()
    };
    if let Some(team_id) = draft.team_id {
        let team = query::get_team(&tx, team_id)?.ok_or(CoreError::NotFound(Missing::Team))?;
        facts.team_exists = true;
        facts.team_in_project = team.project_id == draft.project_id;
        facts.actor_is_lead = team.is_led_by(actor.id);
    }
    access::check_create(actor, facts).map_err(CoreError::PermissionDenied)?;

    if let Some(assignee_id) = draft.assignee_id {
        if query::get_user(&tx, assignee_id)?.is_none() {
            return Err(CoreError::NotFound(Missing::User));
        }
    }

    let index = ParentIndex::from_rows(query::parent_rows(&tx, draft.project_id)?);
    hierarchy::validate_parent(&index, draft.parent_id, draft.issue_type, None)?;

    let prefix = codes::project_prefix(&project);
    let now = crate::now();
    let mut item = WorkItem {
        id: 0,
        project_id: draft.project_id,
        team_id: draft.team_id,
        assignee_id: draft.assignee_id,
        issue_type: draft.issue_type,
        parent_id: draft.parent_id,
        status: draft.status.clone(),
        code: String::new(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        priority: draft
            .priority
            .clone()
            .unwrap_or_else(|| "Medium".to_string()),
        reviewer: draft.reviewer.clone(),
        sprint: draft.sprint.clone(),
        release: draft.release.clone(),
        start_date: draft.start_date.clone(),
        end_date: draft.end_date.clone(),
        created_by: Some(actor.id),
        created_at: now.clone(),
        updated_at: now.clone(),
    };

    item.id = allocate_and_insert(&tx, &prefix, &mut item)?;

    crate::audit::record_created(&tx, item.id, Some(actor.id), &item.status, &now)?;

    if let Some(assignee_id) = item.assignee_id {
        notify_best_effort(
            sink,
            &tx,
            assignee_id,
            "Issue Assigned",
            &format!("You have been assigned to: {}", item.title),
        );
    }

    tx.commit()?;
    info!(issue = item.id, code = %item.code, "issue created");
    Ok(item)
}

/// Scan, insert, and retry on a code collision. Returns the new row id.
fn allocate_and_insert(
    conn: &Connection,
    prefix: &str,
    item: &mut WorkItem,
) -> CoreResult<i64> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let existing = query::codes_with_prefix(conn, prefix)?;
        item.code = codes::next_code(prefix, &existing);

        match query::insert_issue(conn, item) {
            Ok(id) => return Ok(id),
            Err(error) if is_code_conflict(&error) => {
                debug!(code = %item.code, attempt, "issue code taken, rescanning");
            }
            Err(error) => return Err(error.into()),
        }
    }
    Err(CoreError::AllocationExhausted {
        attempts: MAX_CODE_ATTEMPTS,
    })
}

fn is_code_conflict(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(inner, Some(message)) => {
            inner.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains("issues.code")
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Update a work item from a partial patch.
///
/// A patch whose values all normalize equal to the current row is a
/// no-op: nothing is written and no audit entry appears.
///
/// # Errors
///
/// `NotFound`, `ProjectInactive`, `PermissionDenied`, hierarchy and
/// workflow rejections, or a store failure.
pub fn update_issue(
    conn: &mut Connection,
    sink: &dyn NotificationSink,
    actor: &Actor,
    issue_id: i64,
    patch: &IssuePatch,
) -> CoreResult<WorkItem> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = query::get_issue(&tx, issue_id)?.ok_or(CoreError::NotFound(Missing::Issue))?;
    let project = query::get_project(&tx, current.project_id)?
        .ok_or(CoreError::NotFound(Missing::Project))?;
    if !project.is_active {
        return Err(CoreError::ProjectInactive);
    }

    let facts = issue_facts(&tx, actor, &current)?;
    access::check_issue(actor, Action::Update, facts).map_err(CoreError::PermissionDenied)?;

    // Referential checks on the incoming values.
    if let Some(Some(team_id)) = patch.team_id {
        let team = query::get_team(&tx, team_id)?.ok_or(CoreError::NotFound(Missing::Team))?;
        if team.project_id != current.project_id {
            return Err(CoreError::PermissionDenied(
                crate::error::DenyReason::TeamProjectMismatch,
            ));
        }
    }
    if let Some(Some(assignee_id)) = patch.assignee_id {
        if query::get_user(&tx, assignee_id)?.is_none() {
            return Err(CoreError::NotFound(Missing::User));
        }
    }
    if let Some(parent_id) = patch.parent_id {
        let index = ParentIndex::from_rows(query::parent_rows(&tx, current.project_id)?);
        hierarchy::validate_parent(&index, parent_id, current.issue_type, Some(current.id))?;
    }
    if let Some(new_status) = &patch.status {
        let children = query::child_statuses(&tx, current.id)?;
        workflow::check_transition(&current.status, new_status, &children)?;
    }

    let updated = apply_patch(&current, patch);
    let diff = compute_diff(&current, &updated);
    if diff.is_empty() {
        debug!(issue = current.id, "no-op update, nothing recorded");
        return Ok(current);
    }

    let now = crate::now();
    let mut updated = updated;
    updated.updated_at = now.clone();
    query::update_issue(&tx, &updated)?;
    crate::audit::record_updated(&tx, updated.id, Some(actor.id), &diff, &now)?;

    emit_update_notifications(sink, &tx, &diff, &updated);

    tx.commit()?;
    info!(
        issue = updated.id,
        changes = diff.change_count(),
        "issue updated"
    );
    Ok(updated)
}

fn apply_patch(current: &WorkItem, patch: &IssuePatch) -> WorkItem {
    let mut item = current.clone();
    if let Some(title) = &patch.title {
        item.title = title.clone();
    }
    if let Some(description) = &patch.description {
        item.description = description.clone();
    }
    if let Some(status) = &patch.status {
        item.status = status.clone();
    }
    if let Some(priority) = &patch.priority {
        item.priority = priority.clone();
    }
    if let Some(team_id) = patch.team_id {
        item.team_id = team_id;
    }
    if let Some(assignee_id) = patch.assignee_id {
        item.assignee_id = assignee_id;
    }
    if let Some(parent_id) = patch.parent_id {
        item.parent_id = parent_id;
    }
    if let Some(reviewer) = &patch.reviewer {
        item.reviewer = reviewer.clone();
    }
    if let Some(sprint) = &patch.sprint {
        item.sprint = sprint.clone();
    }
    if let Some(release) = &patch.release {
        item.release = release.clone();
    }
    if let Some(start_date) = &patch.start_date {
        item.start_date = start_date.clone();
    }
    if let Some(end_date) = &patch.end_date {
        item.end_date = end_date.clone();
    }
    item
}

fn opt_id(value: Option<i64>) -> Option<String> {
    value.map(|id| id.to_string())
}

/// Diff two issue states in the fixed field-evaluation order.
fn compute_diff(old: &WorkItem, new: &WorkItem) -> DiffBuilder {
    let mut diff = DiffBuilder::new();
    diff.field(
        "team",
        FieldKind::Text,
        opt_id(old.team_id).as_deref(),
        opt_id(new.team_id).as_deref(),
    );
    diff.field(
        "parent",
        FieldKind::Text,
        opt_id(old.parent_id).as_deref(),
        opt_id(new.parent_id).as_deref(),
    );
    diff.field("title", FieldKind::Text, Some(&old.title), Some(&new.title));
    diff.field("status", FieldKind::Text, Some(&old.status), Some(&new.status));
    diff.field(
        "priority",
        FieldKind::Text,
        Some(&old.priority),
        Some(&new.priority),
    );
    diff.field(
        "assignee",
        FieldKind::Text,
        opt_id(old.assignee_id).as_deref(),
        opt_id(new.assignee_id).as_deref(),
    );
    diff.field(
        "description",
        FieldKind::Text,
        Some(&old.description),
        Some(&new.description),
    );
    diff.field(
        "reviewer",
        FieldKind::Text,
        old.reviewer.as_deref(),
        new.reviewer.as_deref(),
    );
    diff.field("sprint", FieldKind::Text, old.sprint.as_deref(), new.sprint.as_deref());
    diff.field(
        "release",
        FieldKind::Text,
        old.release.as_deref(),
        new.release.as_deref(),
    );
    diff.field(
        "start_date",
        FieldKind::Date,
        old.start_date.as_deref(),
        new.start_date.as_deref(),
    );
    diff.field(
        "end_date",
        FieldKind::Date,
        old.end_date.as_deref(),
        new.end_date.as_deref(),
    );
    diff
}

/// Status, priority, and assignee changes each owe the affected
/// assignee one notification.
fn emit_update_notifications(
    sink: &dyn NotificationSink,
    conn: &Connection,
    diff: &DiffBuilder,
    updated: &WorkItem,
) {
    let changed = |field: &str| diff.changes().iter().any(|c| c.field == field);

    if let Some(assignee_id) = updated.assignee_id {
        if changed("status") {
            notify_best_effort(
                sink,
                conn,
                assignee_id,
                "Status Updated",
                &format!("Story '{}' is now {}", updated.title, updated.status),
            );
        }
        if changed("priority") {
            notify_best_effort(
                sink,
                conn,
                assignee_id,
                "Priority Updated",
                &format!(
                    "Priority for '{}' changed to {}",
                    updated.title, updated.priority
                ),
            );
        }
        if changed("assignee") {
            notify_best_effort(
                sink,
                conn,
                assignee_id,
                "Issue Assigned",
                &format!("You have been assigned to: {}", updated.title),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Delete a work item and its whole subtree (the store cascades through
/// `parent_id`).
///
/// # Errors
///
/// `NotFound`, `ProjectInactive`, `PermissionDenied`, or a store
/// failure.
pub fn delete_issue(conn: &mut Connection, actor: &Actor, issue_id: i64) -> CoreResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = query::get_issue(&tx, issue_id)?.ok_or(CoreError::NotFound(Missing::Issue))?;
    let project = query::get_project(&tx, current.project_id)?
        .ok_or(CoreError::NotFound(Missing::Project))?;
    if !project.is_active {
        return Err(CoreError::ProjectInactive);
    }

    let facts = issue_facts(&tx, actor, &current)?;
    access::check_issue(actor, Action::Delete, facts).map_err(CoreError::PermissionDenied)?;

    query::delete_issue(&tx, issue_id)?;
    tx.commit()?;
    info!(issue = issue_id, code = %current.code, "issue deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one work item, enforcing the view rules.
///
/// # Errors
///
/// `NotFound` only for a truly missing row (existence is checked before
/// permission), `PermissionDenied` for a row the actor may not see, or
/// a store failure.
pub fn get_issue(conn: &Connection, actor: &Actor, issue_id: i64) -> CoreResult<WorkItem> {
    let current = query::get_issue(conn, issue_id)?.ok_or(CoreError::NotFound(Missing::Issue))?;
    let facts = issue_facts(conn, actor, &current)?;
    access::check_issue(actor, Action::View, facts).map_err(CoreError::PermissionDenied)?;
    Ok(current)
}

/// List the issues the actor can see, optionally restricted to one
/// project.
///
/// View-mode scope first (admins skip it), then per-issue view rules.
///
/// # Errors
///
/// `NotFound` when a named project does not exist; store failures.
pub fn list_visible_issues(
    conn: &Connection,
    actor: &Actor,
    project_id: Option<i64>,
) -> CoreResult<Vec<WorkItem>> {
    if let Some(id) = project_id {
        if query::get_project(conn, id)?.is_none() {
            return Err(CoreError::NotFound(Missing::Project));
        }
    }

    let candidates = match project_id {
        Some(id) => query::issues_by_project(conn, id)?,
        None => query::all_issues(conn)?,
    };

    if actor.is_admin() {
        return Ok(candidates);
    }

    let scope: Vec<i64> = match actor.view_mode() {
        ViewMode::Admin => query::owned_project_ids(conn, actor.id)?,
        ViewMode::Developer => query::developer_scope_project_ids(conn, actor.id)?,
    };

    let mut visible = Vec::new();
    for item in candidates {
        if !scope.contains(&item.project_id) {
            continue;
        }
        let facts = issue_facts(conn, actor, &item)?;
        if access::check_issue(actor, Action::View, facts).is_ok() {
            visible.push(item);
        }
    }
    Ok(visible)
}

/// Issues assigned to the actor, across all projects.
///
/// # Errors
///
/// Store failures.
pub fn list_assigned(conn: &Connection, actor: &Actor) -> CoreResult<Vec<WorkItem>> {
    Ok(query::issues_assigned_to(conn, actor.id)?)
}

/// Valid parent choices for an issue of `issue_type` in `project_id`,
/// excluding the subtree of `exclude_id` when moving an existing item.
///
/// # Errors
///
/// `NotFound` for a missing project; store failures.
pub fn list_available_parents(
    conn: &Connection,
    project_id: i64,
    issue_type: IssueType,
    exclude_id: Option<i64>,
) -> CoreResult<Vec<IssueSummary>> {
    if query::get_project(conn, project_id)?.is_none() {
        return Err(CoreError::NotFound(Missing::Project));
    }

    let index = ParentIndex::from_rows(query::parent_rows(conn, project_id)?);
    let selectable = hierarchy::selectable_parent_ids(&index, issue_type, exclude_id);

    let summaries = query::summaries_by_types(
        conn,
        project_id,
        hierarchy::allowed_parent_types(issue_type),
    )?;
    Ok(summaries
        .into_iter()
        .filter(|s| selectable.contains(&s.id))
        .collect())
}

/// The audit trail for one issue, newest first.
///
/// # Errors
///
/// `NotFound` for a missing issue; store failures.
pub fn get_activity(conn: &Connection, issue_id: i64) -> CoreResult<Vec<AuditEntry>> {
    if query::get_issue(conn, issue_id)?.is_none() {
        return Err(CoreError::NotFound(Missing::Issue));
    }
    Ok(query::audit_for_issue(conn, issue_id)?)
}

/// Issue counts by status, type, and priority for one project.
///
/// # Errors
///
/// `NotFound` for a missing project; store failures.
pub fn project_stats(conn: &Connection, project_id: i64) -> CoreResult<query::ProjectStats> {
    if query::get_project(conn, project_id)?.is_none() {
        return Err(CoreError::NotFound(Missing::Project));
    }
    Ok(query::project_stats(conn, project_id)?)
}

// ---------------------------------------------------------------------------
// Project activation
// ---------------------------------------------------------------------------

/// Reactivate an inactive project: the one mutation the inactive gate
/// does not block.
///
/// # Errors
///
/// `NotFound`, `PermissionDenied`, or a store failure.
pub fn reactivate_project(conn: &mut Connection, actor: &Actor, project_id: i64) -> CoreResult<()> {
    set_project_active(conn, actor, project_id, true)
}

/// Archive (deactivate) a project. Admin/owner only, like reactivation.
///
/// # Errors
///
/// `NotFound`, `PermissionDenied`, or a store failure.
pub fn archive_project(conn: &mut Connection, actor: &Actor, project_id: i64) -> CoreResult<()> {
    set_project_active(conn, actor, project_id, false)
}

fn set_project_active(
    conn: &mut Connection,
    actor: &Actor,
    project_id: i64,
    active: bool,
) -> CoreResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let project =
        query::get_project(&tx, project_id)?.ok_or(CoreError::NotFound(Missing::Project))?;
    access::check_project_admin(actor, project.owner_id).map_err(CoreError::PermissionDenied)?;

    query::set_project_active(&tx, project_id, active, &crate::now())?;
    tx.commit()?;
    info!(project = project_id, active, "project active flag changed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Fact assembly
// ---------------------------------------------------------------------------

/// Gather the per-issue facts the pure predicate rules on.
fn issue_facts(conn: &Connection, actor: &Actor, item: &WorkItem) -> CoreResult<IssueFacts> {
    let mut facts = IssueFacts {
        is_assignee: item.assignee_id == Some(actor.id),
        leads_any_team_in_project: query::leads_team_in_project(conn, actor.id, item.project_id)?,
        assigned_in_project: query::has_assignment_in_project(conn, actor.id, item.project_id)?,
        ..IssueFacts::default()
    };

    if let Some(team_id) = item.team_id {
        if let Some(team) = query::get_team(conn, team_id)? {
            facts.leads_issue_team = team.is_led_by(actor.id);
        }
        facts.member_of_issue_team = query::is_team_member(conn, team_id, actor.id)?;
    }

    Ok(facts)
}
