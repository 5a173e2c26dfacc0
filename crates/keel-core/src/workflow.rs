//! Status-transition gating.
//!
//! Status is a free-form string; the only enforced rule is the Done-gate:
//! an item may move into "Done" (case-insensitive, trimmed) only when
//! every direct child is already Done. Everything else passes.

use crate::error::CoreError;

/// `true` when `status` reads as Done, ignoring case and surrounding
/// whitespace.
#[must_use]
pub fn is_done(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("done")
}

/// Gate a transition from `current_status` to `new_status` given the
/// direct children's statuses.
///
/// Only the transition *into* Done is inspected; the rejection carries
/// the number of children still pending.
///
/// # Errors
///
/// [`CoreError::BlockedByChildren`] when one or more children are not
/// yet Done.
pub fn check_transition(
    current_status: &str,
    new_status: &str,
    child_statuses: &[String],
) -> Result<(), CoreError> {
    if !is_done(new_status) || is_done(current_status) {
        return Ok(());
    }

    let pending = child_statuses.iter().filter(|s| !is_done(s)).count();
    if pending > 0 {
        tracing::debug!(pending, "done transition blocked by children");
        return Err(CoreError::BlockedByChildren { pending });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_transition, is_done};
    use crate::error::CoreError;

    fn statuses(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn done_matching_is_case_insensitive() {
        assert!(is_done("Done"));
        assert!(is_done("DONE"));
        assert!(is_done("  done "));
        assert!(!is_done("Done-ish"));
        assert!(!is_done("In Progress"));
    }

    #[test]
    fn non_done_transitions_are_unrestricted() {
        let children = statuses(&["Open", "Open"]);
        assert!(check_transition("Open", "In Progress", &children).is_ok());
        assert!(check_transition("Done", "Reopened", &children).is_ok());
    }

    #[test]
    fn done_blocked_by_pending_children() {
        let children = statuses(&["Done", "In Progress"]);
        let err = check_transition("In Progress", "Done", &children).unwrap_err();
        assert!(matches!(err, CoreError::BlockedByChildren { pending: 1 }));
        assert!(err.to_string().contains('1'), "message: {err}");
    }

    #[test]
    fn done_allowed_when_all_children_done() {
        let children = statuses(&["Done", "done", " DONE "]);
        assert!(check_transition("In Progress", "Done", &children).is_ok());
    }

    #[test]
    fn done_allowed_without_children() {
        assert!(check_transition("Open", "Done", &[]).is_ok());
    }

    #[test]
    fn already_done_is_not_regated() {
        // Restating Done while a child reopened must not trip the gate;
        // the audit layer will drop it as a no-op anyway.
        let children = statuses(&["Open"]);
        assert!(check_transition("Done", "Done", &children).is_ok());
    }

    #[test]
    fn pending_count_names_every_open_child() {
        let children = statuses(&["Open", "Blocked", "In Review"]);
        let err = check_transition("Open", "done", &children).unwrap_err();
        assert!(matches!(err, CoreError::BlockedByChildren { pending: 3 }));
    }
}
