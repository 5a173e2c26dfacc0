//! Human-readable issue code allocation (`PREFIX-NNNN`).
//!
//! # Overview
//!
//! Codes are unique, zero-padded to four digits (unbounded beyond), and
//! numerically increasing per prefix. Deleted issues leave gaps that are
//! never reused.
//!
//! # Allocation scope
//!
//! Scope is the prefix, not the project: the allocator scans every
//! stored code sharing the prefix, takes the numeric maximum, and
//! allocates `max + 1`. Malformed legacy suffixes are skipped, never
//! treated as errors.
//!
//! # Races
//!
//! Compute-then-insert alone is not safe under concurrent creates. The
//! `UNIQUE` constraint on `issues.code` is the arbiter: the service
//! re-scans and retries when an insert lands on a taken code. See
//! [`crate::service`].

use crate::model::team::Project;

/// Digits in a freshly padded numeric suffix.
pub const CODE_PAD_WIDTH: usize = 4;

/// The prefix used for a project's codes: the configured prefix when
/// present, else the first two characters of the project name,
/// uppercased.
#[must_use]
pub fn project_prefix(project: &Project) -> String {
    let configured = project.prefix.trim();
    if configured.is_empty() {
        project.name.trim().chars().take(2).collect::<String>()
    } else {
        configured.to_string()
    }
    .to_uppercase()
}

/// Parse the numeric suffix of `code` for the given prefix. Returns
/// `None` when the code belongs to another prefix or the suffix is not
/// purely numeric.
#[must_use]
pub fn numeric_suffix(code: &str, prefix: &str) -> Option<u64> {
    let rest = code.strip_prefix(prefix)?.strip_prefix('-')?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Longer-than-u64 suffixes are malformed legacy data, not errors.
    rest.parse().ok()
}

/// Format a code from prefix and sequence number.
#[must_use]
pub fn format_code(prefix: &str, number: u64) -> String {
    format!("{prefix}-{number:0width$}", width = CODE_PAD_WIDTH)
}

/// The next code for `prefix` given every stored code that matched the
/// prefix scan: `max + 1`, starting at 1 on an empty scan.
#[must_use]
pub fn next_code(prefix: &str, existing_codes: &[String]) -> String {
    let max = existing_codes
        .iter()
        .filter_map(|code| numeric_suffix(code, prefix))
        .max()
        .unwrap_or(0);
    format_code(prefix, max + 1)
}
