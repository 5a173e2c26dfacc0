//! Pure permission predicate for work-item operations.
//!
//! # Overview
//!
//! Every rule is a function over an explicit fact struct the service
//! assembles from the store. Nothing in this module touches a database:
//! the capability matrix is fully unit-testable with hand-built facts.
//!
//! The project-active gate is deliberately *not* part of this module.
//! An inactive project blocks mutations for everyone, admins included;
//! that is project state, not a role question, and the service applies
//! it before evaluating permissions.
//!
//! `ViewMode` is likewise absent: it is a scope selector the listing
//! path applies before per-issue checks, never a grant.

use crate::error::DenyReason;
use crate::model::actor::Actor;

/// The four actions the predicate rules on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    View,
    Update,
    Delete,
}

/// Facts needed to rule on a creation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateFacts {
    /// A team id was supplied at all.
    pub team_named: bool,
    /// The named team exists.
    pub team_exists: bool,
    /// The named team belongs to the target project.
    pub team_in_project: bool,
    /// The actor is the named team's lead.
    pub actor_is_lead: bool,
}

/// Facts about one actor relative to one existing work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueFacts {
    /// Actor leads the item's team (false when the item has no team).
    pub leads_issue_team: bool,
    /// Actor is the item's assignee.
    pub is_assignee: bool,
    /// Actor leads at least one team in the item's project.
    pub leads_any_team_in_project: bool,
    /// Actor is a member of the item's team.
    pub member_of_issue_team: bool,
    /// Actor is assignee on some other issue in the same project (the
    /// transitive project-visibility rule for contributors).
    pub assigned_in_project: bool,
}

/// Rule on a creation request.
///
/// Admins (role or master flag) pass unconditionally. Everyone else must
/// name a team they lead, and that team must belong to the target
/// project. Read-only roles never create.
///
/// # Errors
///
/// Returns the specific [`DenyReason`] for the first unmet condition.
pub fn check_create(actor: &Actor, facts: CreateFacts) -> Result<(), DenyReason> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.role.is_read_only() {
        return Err(DenyReason::ReadOnlyRole);
    }
    if !facts.team_named || !facts.team_exists || !facts.actor_is_lead {
        return Err(DenyReason::NotLeadOfTargetTeam);
    }
    if !facts.team_in_project {
        return Err(DenyReason::TeamProjectMismatch);
    }
    Ok(())
}

/// Rule on view/update/delete against an existing item.
///
/// - **view**: project lead, team member, assignee, or assignee anywhere
///   in the project.
/// - **update**: the item's team lead or its assignee.
/// - **delete**: the item's team lead only, never assignee-only.
///
/// # Errors
///
/// Returns the specific [`DenyReason`] for the action.
///
/// # Panics
///
/// Panics if called with [`Action::Create`]; creation has no existing
/// item and goes through [`check_create`].
pub fn check_issue(actor: &Actor, action: Action, facts: IssueFacts) -> Result<(), DenyReason> {
    if actor.is_admin() {
        return Ok(());
    }

    match action {
        Action::Create => unreachable!("creation is ruled on by check_create"),
        Action::View => {
            if facts.leads_any_team_in_project
                || facts.member_of_issue_team
                || facts.is_assignee
                || facts.assigned_in_project
            {
                Ok(())
            } else {
                Err(DenyReason::NotVisible)
            }
        }
        Action::Update => {
            if actor.role.is_read_only() {
                return Err(DenyReason::ReadOnlyRole);
            }
            if facts.leads_issue_team || facts.is_assignee {
                Ok(())
            } else {
                Err(DenyReason::NotLeadOrAssignee)
            }
        }
        Action::Delete => {
            if actor.role.is_read_only() {
                return Err(DenyReason::ReadOnlyRole);
            }
            if facts.leads_issue_team {
                Ok(())
            } else {
                Err(DenyReason::NotLead)
            }
        }
    }
}

/// Rule on project reactivation (and archiving): admins and the project
/// owner only.
///
/// # Errors
///
/// Returns [`DenyReason::NotOwnerOrAdmin`] otherwise.
pub fn check_project_admin(actor: &Actor, owner_id: Option<i64>) -> Result<(), DenyReason> {
    if actor.is_admin() || owner_id == Some(actor.id) {
        Ok(())
    } else {
        Err(DenyReason::NotOwnerOrAdmin)
    }
}
