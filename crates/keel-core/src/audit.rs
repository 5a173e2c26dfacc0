//! Aggregated audit diffs: one entry per accepted mutation.
//!
//! # Overview
//!
//! An update's audit entry is computed by normalizing old and new values
//! to strings and keeping only the fields whose normalized values differ.
//! An empty diff writes nothing: restating current values is a no-op.
//!
//! Normalization: trim whitespace, `None` becomes the empty string, and
//! date-kind values compare on their `YYYY-MM-DD` slice only.

use rusqlite::Connection;

use crate::db::query;
use crate::model::audit::{AuditAction, AuditEntry};

/// How a field's values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
}

/// One changed field, already normalized and confirmed different.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// Accumulates field comparisons for one update transaction, in
/// evaluation order.
#[derive(Debug, Default)]
pub struct DiffBuilder {
    changes: Vec<FieldChange>,
}

impl DiffBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a field's old and new values; record the change when the
    /// normalized values differ.
    pub fn field(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        old: Option<&str>,
        new: Option<&str>,
    ) -> &mut Self {
        let norm_old = normalize_value(old, kind);
        let norm_new = normalize_value(new, kind);
        if norm_old != norm_new {
            self.changes.push(FieldChange {
                field: name,
                old: norm_old,
                new: norm_new,
            });
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Render the human-readable block: one `field: old -> new` line per
    /// change, in evaluation order.
    #[must_use]
    pub fn render(&self) -> String {
        self.changes
            .iter()
            .map(|c| format!("{}: {} -> {}", c.field, c.old, c.new))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn change_count(&self) -> u32 {
        u32::try_from(self.changes.len()).unwrap_or(u32::MAX)
    }
}

/// Normalize a value for comparison and display.
#[must_use]
pub fn normalize_value(value: Option<&str>, kind: FieldKind) -> String {
    let trimmed = value.unwrap_or("").trim();
    match kind {
        FieldKind::Text => trimmed.to_string(),
        // Dates compare on the YYYY-MM-DD slice; timestamps appended by
        // upstream layers must not register as changes.
        FieldKind::Date => trimmed.chars().take(10).collect(),
    }
}

/// Append the Created entry for a new issue: a single line naming the
/// initial status, `change_count = 1`.
///
/// # Errors
///
/// Propagates store failures.
pub fn record_created(
    conn: &Connection,
    issue_id: i64,
    actor_id: Option<i64>,
    initial_status: &str,
    now: &str,
) -> rusqlite::Result<i64> {
    let changes = format!("Issue Created (status: {initial_status})");
    query::append_audit(conn, issue_id, actor_id, AuditAction::Created, &changes, 1, now)
}

/// Append the Updated entry for a non-empty diff. Callers must skip the
/// call entirely when the diff is empty; zero-change entries are never
/// persisted and the schema rejects them.
///
/// # Errors
///
/// Propagates store failures.
pub fn record_updated(
    conn: &Connection,
    issue_id: i64,
    actor_id: Option<i64>,
    diff: &DiffBuilder,
    now: &str,
) -> rusqlite::Result<i64> {
    debug_assert!(!diff.is_empty(), "empty diffs are dropped by the caller");
    query::append_audit(
        conn,
        issue_id,
        actor_id,
        AuditAction::Updated,
        &diff.render(),
        diff.change_count(),
        now,
    )
}

/// Audit entries for one issue, newest first.
///
/// # Errors
///
/// Propagates store failures.
pub fn activity(conn: &Connection, issue_id: i64) -> rusqlite::Result<Vec<AuditEntry>> {
    query::audit_for_issue(conn, issue_id)
}
