//! Best-effort notification emission.
//!
//! Status, priority, and assignee changes each owe one notification to
//! the affected assignee. Emission must never abort a mutation that
//! otherwise succeeded; failures are logged and swallowed at the call
//! site via [`notify_best_effort`].

use rusqlite::Connection;

use crate::db::query;

/// A destination for user-facing notifications. The store-backed sink
/// writes rows inside the caller's transaction; tests substitute
/// recording or failing sinks.
pub trait NotificationSink {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Implementations may fail; callers treat failure as non-fatal.
    fn notify(
        &self,
        conn: &Connection,
        user_id: i64,
        title: &str,
        message: &str,
    ) -> anyhow::Result<()>;
}

/// Sink that persists notifications in the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreSink;

impl NotificationSink for StoreSink {
    fn notify(
        &self,
        conn: &Connection,
        user_id: i64,
        title: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        let now = crate::now();
        query::insert_notification(conn, user_id, title, message, &now)?;
        Ok(())
    }
}

/// Sink that drops everything. Used when notifications are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _: &Connection, _: i64, _: &str, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Emit a notification, logging (never propagating) failures.
pub fn notify_best_effort(
    sink: &dyn NotificationSink,
    conn: &Connection,
    user_id: i64,
    title: &str,
    message: &str,
) {
    if let Err(error) = sink.notify(conn, user_id, title, message) {
        tracing::warn!(user_id, title, %error, "notification emission failed");
    }
}
