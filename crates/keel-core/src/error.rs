//! Error taxonomy for the keel core.
//!
//! Every failure a mutation or query can surface is one of a closed set of
//! variants, each with a stable machine-readable `E####` code for
//! agent-friendly decision making. Check order is fixed across all entry
//! points: existence → project-active gate → permission → hierarchy and
//! workflow validation → write. Every error aborts the enclosing
//! transaction; the audit trail never records a failed mutation.

use thiserror::Error;

/// What kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Project,
    Team,
    User,
    Issue,
}

impl Missing {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Team => "Team",
            Self::User => "User",
            Self::Issue => "Issue",
        }
    }
}

/// Why the permission predicate said no. Each reason carries its own
/// user-facing message rather than a generic "denied".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The account role may read but never mutate.
    ReadOnlyRole,
    /// Creation requires naming a team the actor leads.
    NotLeadOfTargetTeam,
    /// The named team does not belong to the target project.
    TeamProjectMismatch,
    /// Update requires leading the issue's team or being its assignee.
    NotLeadOrAssignee,
    /// Deletion is lead-only, never assignee-only.
    NotLead,
    /// None of the view rules matched.
    NotVisible,
    /// Project reactivation is restricted to admins and the owner.
    NotOwnerOrAdmin,
}

impl DenyReason {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ReadOnlyRole => "Read-only access for this role",
            Self::NotLeadOfTargetTeam => {
                "Insufficient permissions to create issue in this context. \
                 Team Leads must specify their team."
            }
            Self::TeamProjectMismatch => "The team does not belong to this project.",
            Self::NotLeadOrAssignee => "No permission to edit this issue.",
            Self::NotLead => "Only the team lead may delete this issue.",
            Self::NotVisible => "Access denied",
            Self::NotOwnerOrAdmin => "Only Admins or the project owner can perform this action",
        }
    }
}

/// The closed failure set for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{} not found", .0.as_str())]
    NotFound(Missing),

    #[error("{}", .0.message())]
    PermissionDenied(DenyReason),

    #[error("The project is inactive.")]
    ProjectInactive,

    #[error("Invalid parent assignment: {0}")]
    InvalidParent(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("cannot transition to Done: {pending} child issue(s) not yet Done")]
    BlockedByChildren { pending: usize },

    /// Code allocation kept colliding after the bounded retry loop. The
    /// per-attempt conflict itself is retried transparently and never
    /// surfaced.
    #[error("issue code allocation conflicted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

impl CoreError {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E2001",
            Self::PermissionDenied(_) => "E2002",
            Self::ProjectInactive => "E2003",
            Self::InvalidParent(_) => "E2004",
            Self::CircularDependency(_) => "E2005",
            Self::BlockedByChildren { .. } => "E2006",
            Self::AllocationExhausted { .. } => "E3001",
            Self::Store(_) => "E5001",
        }
    }

    /// `true` for the failures the caller can correct by changing the
    /// request (as opposed to store-level faults).
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        !matches!(self, Self::AllocationExhausted { .. } | Self::Store(_))
    }
}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::{CoreError, DenyReason, Missing};
    use std::collections::HashSet;

    fn all_variants() -> Vec<CoreError> {
        vec![
            CoreError::NotFound(Missing::Issue),
            CoreError::PermissionDenied(DenyReason::NotVisible),
            CoreError::ProjectInactive,
            CoreError::InvalidParent("story requires an epic parent".to_string()),
            CoreError::CircularDependency("issue 3 is its own ancestor".to_string()),
            CoreError::BlockedByChildren { pending: 2 },
            CoreError::AllocationExhausted { attempts: 5 },
            CoreError::Store(rusqlite::Error::InvalidQuery),
        ]
    }

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for err in all_variants() {
            assert!(seen.insert(err.code()), "duplicate code {}", err.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for err in all_variants() {
            let code = err.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn denial_messages_are_specific() {
        let mut seen = HashSet::new();
        for reason in [
            DenyReason::ReadOnlyRole,
            DenyReason::NotLeadOfTargetTeam,
            DenyReason::TeamProjectMismatch,
            DenyReason::NotLeadOrAssignee,
            DenyReason::NotLead,
            DenyReason::NotVisible,
            DenyReason::NotOwnerOrAdmin,
        ] {
            assert!(seen.insert(reason.message()), "duplicate denial message");
        }
    }

    #[test]
    fn display_names_the_pending_count() {
        let err = CoreError::BlockedByChildren { pending: 1 };
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn request_errors_classified() {
        assert!(CoreError::ProjectInactive.is_request_error());
        assert!(!CoreError::AllocationExhausted { attempts: 5 }.is_request_error());
    }
}
