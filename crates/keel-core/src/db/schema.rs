//! Canonical SQLite schema for the keel store.
//!
//! The schema is normalized around the mutation service's needs:
//! - `users`, `projects`, `teams`, `team_members` hold the identity and
//!   membership facts the core consumes from the driver layer
//! - `issues` keeps every work item with a self-referential `parent_id`
//!   (forest structure, cascade-delete on parent removal)
//! - `audit_log` is append-only, one row per accepted mutation
//! - `notifications` receives best-effort sink writes

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE CHECK (length(trim(username)) > 0),
    role TEXT NOT NULL DEFAULT 'developer'
        CHECK (role IN ('admin', 'developer', 'tester', 'other')),
    view_mode TEXT NOT NULL DEFAULT 'developer'
        CHECK (view_mode IN ('admin', 'developer')),
    is_master_admin INTEGER NOT NULL DEFAULT 0 CHECK (is_master_admin IN (0, 1)),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    prefix TEXT NOT NULL DEFAULT '',
    owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    lead_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_members (
    team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    PRIMARY KEY (team_id, user_id)
);

CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
    assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    issue_type TEXT NOT NULL
        CHECK (issue_type IN ('epic', 'story', 'task', 'bug', 'subtask')),
    parent_id INTEGER REFERENCES issues(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL DEFAULT 'Medium',
    reviewer TEXT,
    sprint TEXT,
    release TEXT,
    start_date TEXT,
    end_date TEXT,
    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id INTEGER NOT NULL REFERENCES issues(id) ON DELETE CASCADE,
    actor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    action TEXT NOT NULL CHECK (action IN ('created', 'updated')),
    changes TEXT NOT NULL,
    change_count INTEGER NOT NULL CHECK (change_count > 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0 CHECK (is_read IN (0, 1)),
    created_at TEXT NOT NULL
);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_issues_project
    ON issues(project_id, issue_type);

CREATE INDEX IF NOT EXISTS idx_issues_parent
    ON issues(parent_id);

CREATE INDEX IF NOT EXISTS idx_issues_assignee
    ON issues(assignee_id, project_id);

CREATE INDEX IF NOT EXISTS idx_issues_team
    ON issues(team_id);

CREATE INDEX IF NOT EXISTS idx_teams_project_lead
    ON teams(project_id, lead_id);

CREATE INDEX IF NOT EXISTS idx_audit_log_issue_created
    ON audit_log(issue_id, created_at DESC, id DESC);

CREATE INDEX IF NOT EXISTS idx_notifications_user_read
    ON notifications(user_id, is_read);
";

/// Indexes the migration suite must produce; checked by tests.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_issues_project",
    "idx_issues_parent",
    "idx_issues_assignee",
    "idx_issues_team",
    "idx_teams_project_lead",
    "idx_audit_log_issue_created",
    "idx_notifications_user_read",
];
