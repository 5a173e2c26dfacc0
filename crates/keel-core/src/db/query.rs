//! Typed query helpers for the keel store.
//!
//! All functions take a shared `&Connection` reference and return typed
//! structs (never raw rows). Mutating helpers are written so they compose
//! inside a caller-held transaction: they execute single statements and
//! leave commit/rollback to the service layer.

#![allow(clippy::missing_errors_doc)]

use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::str::FromStr;

use crate::model::actor::{Actor, Role, ViewMode};
use crate::model::audit::{AuditAction, AuditEntry};
use crate::model::issue::{IssueSummary, IssueType, WorkItem};
use crate::model::team::{Project, Team};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A best-effort notification row written by the sink.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Aggregate counters for one project, used by reporting commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ProjectStats {
    pub by_status: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub by_priority: HashMap<String, usize>,
}

/// One row of the parent index: enough to validate hierarchy moves
/// without loading whole items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub issue_type: IssueType,
}

fn parse_column<T: FromStr>(idx: usize, value: &str, expected: &'static str) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(|e| {
        tracing::warn!(column = expected, value, "unparseable enum column");
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

fn map_user(row: &Row<'_>) -> rusqlite::Result<Actor> {
    let role: String = row.get(2)?;
    let view_mode: String = row.get(3)?;
    Ok(Actor::new(
        row.get(0)?,
        row.get(1)?,
        parse_column(2, &role, "role")?,
        parse_column(3, &view_mode, "view_mode")?,
        row.get::<_, i64>(4)? != 0,
    ))
}

const USER_COLUMNS: &str = "id, username, role, view_mode, is_master_admin";

/// Insert an identity row and return its id. Driver-layer seeding only.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    role: Role,
    view_mode: ViewMode,
    is_master_admin: bool,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, role, view_mode, is_master_admin, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            username,
            role.to_string(),
            view_mode.to_string(),
            i64::from(is_master_admin),
            now
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<Actor>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        map_user,
    )
    .optional()
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<Actor>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        map_user,
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn map_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        prefix: row.get(2)?,
        owner_id: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
    })
}

const PROJECT_COLUMNS: &str = "id, name, prefix, owner_id, is_active";

pub fn insert_project(
    conn: &Connection,
    name: &str,
    prefix: &str,
    owner_id: Option<i64>,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, prefix, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, prefix, owner_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_project(conn: &Connection, id: i64) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        map_project,
    )
    .optional()
}

pub fn list_projects(conn: &Connection) -> rusqlite::Result<Vec<Project>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"))?;
    let rows = stmt.query_map([], map_project)?;
    rows.collect()
}

/// Flip the active flag; returns `true` when a row was touched.
pub fn set_project_active(
    conn: &Connection,
    id: i64,
    active: bool,
    now: &str,
) -> rusqlite::Result<bool> {
    let touched = conn.execute(
        "UPDATE projects SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, i64::from(active), now],
    )?;
    Ok(touched > 0)
}

/// Projects owned by `user_id` (the admin-mode listing scope).
pub fn owned_project_ids(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM projects WHERE owner_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Teams and membership
// ---------------------------------------------------------------------------

fn map_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        lead_id: row.get(3)?,
    })
}

const TEAM_COLUMNS: &str = "id, project_id, name, lead_id";

pub fn insert_team(
    conn: &Connection,
    project_id: i64,
    name: &str,
    lead_id: Option<i64>,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO teams (project_id, name, lead_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![project_id, name, lead_id, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_team(conn: &Connection, id: i64) -> rusqlite::Result<Option<Team>> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
        params![id],
        map_team,
    )
    .optional()
}

pub fn add_team_member(conn: &Connection, team_id: i64, user_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?1, ?2)",
        params![team_id, user_id],
    )?;
    Ok(())
}

pub fn is_team_member(conn: &Connection, team_id: i64, user_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = ?1 AND user_id = ?2)",
        params![team_id, user_id],
        |row| row.get(0),
    )
}

/// `true` when `user_id` leads at least one team in `project_id`.
pub fn leads_team_in_project(
    conn: &Connection,
    user_id: i64,
    project_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE project_id = ?1 AND lead_id = ?2)",
        params![project_id, user_id],
        |row| row.get(0),
    )
}

/// Distinct projects reachable by a developer-mode actor: any project
/// where they lead a team, sit on a team, or hold an assignment.
pub fn developer_scope_project_ids(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT project_id FROM teams WHERE lead_id = ?1
         UNION
         SELECT t.project_id FROM teams t
             JOIN team_members m ON m.team_id = t.id
             WHERE m.user_id = ?1
         UNION
         SELECT project_id FROM issues WHERE assignee_id = ?1",
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

fn map_issue(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let issue_type: String = row.get(4)?;
    Ok(WorkItem {
        id: row.get(0)?,
        project_id: row.get(1)?,
        team_id: row.get(2)?,
        assignee_id: row.get(3)?,
        issue_type: parse_column(4, &issue_type, "issue_type")?,
        parent_id: row.get(5)?,
        status: row.get(6)?,
        code: row.get(7)?,
        title: row.get(8)?,
        description: row.get(9)?,
        priority: row.get(10)?,
        reviewer: row.get(11)?,
        sprint: row.get(12)?,
        release: row.get(13)?,
        start_date: row.get(14)?,
        end_date: row.get(15)?,
        created_by: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

const ISSUE_COLUMNS: &str = "id, project_id, team_id, assignee_id, issue_type, parent_id, \
     status, code, title, description, priority, reviewer, sprint, release, \
     start_date, end_date, created_by, created_at, updated_at";

/// Insert a fully-populated issue row (id ignored) and return the new id.
///
/// The caller handles `UNIQUE` violations on `code`; they are the
/// allocation-conflict signal, not a fault.
pub fn insert_issue(conn: &Connection, item: &WorkItem) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO issues \
         (project_id, team_id, assignee_id, issue_type, parent_id, status, code, \
          title, description, priority, reviewer, sprint, release, start_date, \
          end_date, created_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            item.project_id,
            item.team_id,
            item.assignee_id,
            item.issue_type.to_string(),
            item.parent_id,
            item.status,
            item.code,
            item.title,
            item.description,
            item.priority,
            item.reviewer,
            item.sprint,
            item.release,
            item.start_date,
            item.end_date,
            item.created_by,
            item.created_at,
            item.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist every mutable column of an existing issue. `project_id` and
/// `code` are immutable after creation and deliberately absent here.
pub fn update_issue(conn: &Connection, item: &WorkItem) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE issues SET \
         team_id = ?2, assignee_id = ?3, parent_id = ?4, status = ?5, title = ?6, \
         description = ?7, priority = ?8, reviewer = ?9, sprint = ?10, release = ?11, \
         start_date = ?12, end_date = ?13, updated_at = ?14 \
         WHERE id = ?1",
        params![
            item.id,
            item.team_id,
            item.assignee_id,
            item.parent_id,
            item.status,
            item.title,
            item.description,
            item.priority,
            item.reviewer,
            item.sprint,
            item.release,
            item.start_date,
            item.end_date,
            item.updated_at,
        ],
    )?;
    Ok(())
}

/// Delete an issue row. Descendants go with it via the `parent_id`
/// cascade; audit rows via the `issue_id` cascade.
pub fn delete_issue(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let touched = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
    Ok(touched > 0)
}

pub fn get_issue(conn: &Connection, id: i64) -> rusqlite::Result<Option<WorkItem>> {
    conn.query_row(
        &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1"),
        params![id],
        map_issue,
    )
    .optional()
}

pub fn all_issues(conn: &Connection) -> rusqlite::Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {ISSUE_COLUMNS} FROM issues ORDER BY id"))?;
    let rows = stmt.query_map([], map_issue)?;
    rows.collect()
}

pub fn issues_by_project(conn: &Connection, project_id: i64) -> rusqlite::Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![project_id], map_issue)?;
    rows.collect()
}

pub fn issues_assigned_to(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<WorkItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ISSUE_COLUMNS} FROM issues WHERE assignee_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![user_id], map_issue)?;
    rows.collect()
}

/// `true` when `user_id` is assignee on any issue of `project_id` (the
/// transitive project-visibility rule for contributors).
pub fn has_assignment_in_project(
    conn: &Connection,
    user_id: i64,
    project_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM issues WHERE project_id = ?1 AND assignee_id = ?2)",
        params![project_id, user_id],
        |row| row.get(0),
    )
}

/// Statuses of all direct children, for the Done-gate.
pub fn child_statuses(conn: &Connection, parent_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT status FROM issues WHERE parent_id = ?1")?;
    let rows = stmt.query_map(params![parent_id], |row| row.get(0))?;
    rows.collect()
}

/// Load the (id, parent, type) triples for one project's issues. The
/// hierarchy validator walks these as an arena rather than chasing live
/// rows.
pub fn parent_rows(conn: &Connection, project_id: i64) -> rusqlite::Result<Vec<ParentRow>> {
    let mut stmt =
        conn.prepare("SELECT id, parent_id, issue_type FROM issues WHERE project_id = ?1")?;
    let rows = stmt.query_map(params![project_id], |row| {
        let issue_type: String = row.get(2)?;
        Ok(ParentRow {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            issue_type: parse_column(2, &issue_type, "issue_type")?,
        })
    })?;
    rows.collect()
}

/// Compact summaries for one project, optionally restricted to a set of
/// issue types, ordered by code for stable pickers.
pub fn summaries_by_types(
    conn: &Connection,
    project_id: i64,
    types: &[IssueType],
) -> rusqlite::Result<Vec<IssueSummary>> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (0..types.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, code, title, issue_type, status FROM issues \
         WHERE project_id = ?1 AND issue_type IN ({placeholders}) ORDER BY code"
    );
    let mut stmt = conn.prepare(&sql)?;
    let type_names: Vec<String> = types.iter().map(ToString::to_string).collect();
    let mut bindings: Vec<&dyn rusqlite::ToSql> = vec![&project_id];
    for name in &type_names {
        bindings.push(name);
    }
    let rows = stmt.query_map(
        rusqlite::params_from_iter(bindings),
        |row| {
            let issue_type: String = row.get(3)?;
            Ok(IssueSummary {
                id: row.get(0)?,
                code: row.get(1)?,
                title: row.get(2)?,
                issue_type: parse_column(3, &issue_type, "issue_type")?,
                status: row.get(4)?,
            })
        },
    )?;
    rows.collect()
}

/// Every issue code starting with `{prefix}-`, across all projects.
/// Allocation scope is the prefix, not the project.
pub fn codes_with_prefix(conn: &Connection, prefix: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT code FROM issues WHERE code LIKE ?1 ESCAPE '\\'")?;
    let escaped = prefix.replace('\\', r"\\").replace('%', r"\%").replace('_', r"\_");
    let pattern = format!("{escaped}-%");
    let rows = stmt.query_map(params![pattern], |row| row.get(0))?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

fn map_audit(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    let action: String = row.get(3)?;
    Ok(AuditEntry {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        actor_id: row.get(2)?,
        action: parse_column(3, &action, "action")?,
        changes: row.get(4)?,
        change_count: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const AUDIT_COLUMNS: &str = "id, issue_id, actor_id, action, changes, change_count, created_at";

/// Append one audit row. There is no update or delete path for this
/// table anywhere in the crate.
pub fn append_audit(
    conn: &Connection,
    issue_id: i64,
    actor_id: Option<i64>,
    action: AuditAction,
    changes: &str,
    change_count: u32,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO audit_log (issue_id, actor_id, action, changes, change_count, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![issue_id, actor_id, action.to_string(), changes, change_count, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Audit entries for one issue, newest first.
pub fn audit_for_issue(conn: &Connection, issue_id: i64) -> rusqlite::Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audit_log WHERE issue_id = ?1 \
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![issue_id], map_audit)?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub fn insert_notification(
    conn: &Connection,
    user_id: i64,
    title: &str,
    message: &str,
    now: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, title, message, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, title, message, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn unread_notifications(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, message, is_read, created_at FROM notifications \
         WHERE user_id = ?1 AND is_read = 0 ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            is_read: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn mark_notification_read(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let touched = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(touched > 0)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counts by status, type, and priority for one project.
pub fn project_stats(conn: &Connection, project_id: i64) -> rusqlite::Result<ProjectStats> {
    let mut stats = ProjectStats::default();

    let mut stmt = conn.prepare(
        "SELECT status, issue_type, priority FROM issues WHERE project_id = ?1",
    )?;
    let rows = stmt.query_map(params![project_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (status, issue_type, priority) = row?;
        *stats.by_status.entry(status).or_insert(0) += 1;
        *stats.by_type.entry(issue_type).or_insert(0) += 1;
        *stats.by_priority.entry(priority).or_insert(0) += 1;
    }

    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
