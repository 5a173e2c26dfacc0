//! End-to-end tests driving the mutation service against an in-memory
//! store: permission rules, hierarchy validation, the Done-gate, code
//! allocation, and the audit trail.

use rusqlite::Connection;

use keel_core::db::{open_in_memory, query};
use keel_core::error::{CoreError, DenyReason, Missing};
use keel_core::model::actor::{Actor, Role, ViewMode};
use keel_core::model::audit::AuditAction;
use keel_core::model::issue::{IssueDraft, IssuePatch, IssueType};
use keel_core::notify::{NotificationSink, NullSink, StoreSink};
use keel_core::service;

const NOW: &str = "2026-02-01T09:00:00Z";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Fixture {
    conn: Connection,
    master: Actor,
    lead: Actor,
    dev: Actor,
    project_id: i64,
    team_id: i64,
}

/// One project "Engine" (prefix ENG) with team "Platform" led by `lead`;
/// `dev` is a plain developer outside the team.
fn fixture() -> Fixture {
    let conn = open_in_memory().expect("open store");

    let master_id = query::insert_user(&conn, "root", Role::Admin, ViewMode::Admin, true, NOW)
        .expect("user");
    let lead_id = query::insert_user(&conn, "lena", Role::Developer, ViewMode::Developer, false, NOW)
        .expect("user");
    let dev_id = query::insert_user(&conn, "devin", Role::Developer, ViewMode::Developer, false, NOW)
        .expect("user");

    let project_id =
        query::insert_project(&conn, "Engine", "ENG", Some(master_id), NOW).expect("project");
    let team_id =
        query::insert_team(&conn, project_id, "Platform", Some(lead_id), NOW).expect("team");

    let load = |id: i64| query::get_user(&conn, id).expect("query").expect("present");
    let master = load(master_id);
    let lead = load(lead_id);
    let dev = load(dev_id);

    Fixture {
        conn,
        master,
        lead,
        dev,
        project_id,
        team_id,
    }
}

fn draft(f: &Fixture, issue_type: IssueType, title: &str) -> IssueDraft {
    IssueDraft::new(f.project_id, Some(f.team_id), issue_type, title)
}

fn create(f: &mut Fixture, issue_type: IssueType, title: &str) -> i64 {
    let actor = f.lead.clone();
    let d = draft(f, issue_type, title);
    service::create_issue(&mut f.conn, &NullSink, &actor, &d)
        .expect("create issue")
        .id
}

fn patch_parent(parent: Option<i64>) -> IssuePatch {
    IssuePatch {
        parent_id: Some(parent),
        ..IssuePatch::default()
    }
}

fn patch_status(status: &str) -> IssuePatch {
    IssuePatch {
        status: Some(status.to_string()),
        ..IssuePatch::default()
    }
}

// ---------------------------------------------------------------------------
// Creation and code allocation
// ---------------------------------------------------------------------------

#[test]
fn first_codes_are_sequential() {
    let mut f = fixture();

    let actor = f.lead.clone();
    let epic_draft = draft(&f, IssueType::Epic, "Launch");
    let epic = service::create_issue(&mut f.conn, &NullSink, &actor, &epic_draft)
        .expect("create epic");
    assert_eq!(epic.code, "ENG-0001");

    let mut story_draft = draft(&f, IssueType::Story, "Signup flow");
    story_draft.parent_id = Some(epic.id);
    let story = service::create_issue(&mut f.conn, &NullSink, &actor, &story_draft)
        .expect("create story");
    assert_eq!(story.code, "ENG-0002");
    assert_eq!(story.parent_id, Some(epic.id));
}

#[test]
fn sequential_creates_never_collide() {
    let mut f = fixture();
    let mut codes: Vec<String> = Vec::new();
    for i in 0..8 {
        let actor = f.lead.clone();
        let d = draft(&f, IssueType::Task, &format!("Task {i}"));
        let item = service::create_issue(&mut f.conn, &NullSink, &actor, &d).expect("create");
        codes.push(item.code);
    }
    let mut deduped = codes.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), codes.len(), "codes must be distinct: {codes:?}");
    assert_eq!(codes.last().map(String::as_str), Some("ENG-0008"));
}

#[test]
fn concurrent_creates_allocate_distinct_codes() {
    use keel_core::db::open_store;
    use std::collections::HashSet;
    use std::thread;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("keel.sqlite3");

    let (lead, project_id, team_id) = {
        let conn = open_store(&path).expect("open store");
        let lead_id =
            query::insert_user(&conn, "lena", Role::Developer, ViewMode::Developer, false, NOW)
                .expect("user");
        let project_id = query::insert_project(&conn, "Engine", "ENG", None, NOW).expect("project");
        let team_id =
            query::insert_team(&conn, project_id, "Platform", Some(lead_id), NOW).expect("team");
        let lead = query::get_user(&conn, lead_id).expect("query").expect("present");
        (lead, project_id, team_id)
    };

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            let lead = lead.clone();
            thread::spawn(move || {
                let mut conn = open_store(&path).expect("open store");
                let mut codes = Vec::new();
                for i in 0..2 {
                    let draft = IssueDraft::new(
                        project_id,
                        Some(team_id),
                        IssueType::Task,
                        &format!("Task {worker}-{i}"),
                    );
                    let item = service::create_issue(&mut conn, &NullSink, &lead, &draft)
                        .expect("concurrent create");
                    codes.push(item.code);
                }
                codes
            })
        })
        .collect();

    let mut all: Vec<String> = Vec::new();
    for handle in handles {
        all.extend(handle.join().expect("worker"));
    }

    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(unique.len(), 8, "codes must be distinct: {all:?}");
    // No gaps either: exactly ENG-0001..ENG-0008.
    for n in 1..=8 {
        let expected = format!("ENG-{n:04}");
        assert!(all.contains(&expected), "missing {expected} in {all:?}");
    }
}

#[test]
fn allocation_steps_over_foreign_rows_with_same_prefix() {
    let mut f = fixture();
    create(&mut f, IssueType::Task, "First");

    // Another project configured with the same prefix shares the
    // sequence: allocation scope is the prefix, not the project.
    let other = query::insert_project(&f.conn, "Engine Tools", "ENG", None, NOW).expect("project");
    f.conn
        .execute(
            "INSERT INTO issues (project_id, issue_type, status, code, title, created_at, updated_at) \
             VALUES (?1, 'task', 'Open', 'ENG-0007', 'Foreign', ?2, ?2)",
            rusqlite::params![other, NOW],
        )
        .expect("foreign row");

    let actor = f.lead.clone();
    let d = draft(&f, IssueType::Task, "Second");
    let item = service::create_issue(&mut f.conn, &NullSink, &actor, &d).expect("create");
    assert_eq!(item.code, "ENG-0008");
}

#[test]
fn deleted_codes_are_never_reused() {
    let mut f = fixture();
    create(&mut f, IssueType::Task, "One");
    let second = create(&mut f, IssueType::Task, "Two");

    let actor = f.lead.clone();
    service::delete_issue(&mut f.conn, &actor, second).expect("delete");

    let third = create(&mut f, IssueType::Task, "Three");
    let item = query::get_issue(&f.conn, third).expect("query").expect("present");
    assert_eq!(item.code, "ENG-0003", "gap from the deleted ENG-0002 stays");
}

#[test]
fn create_requires_lead_of_named_team() {
    let mut f = fixture();

    let actor = f.dev.clone();
    let d = draft(&f, IssueType::Task, "Sneaky");
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(
        err,
        CoreError::PermissionDenied(DenyReason::NotLeadOfTargetTeam)
    ));

    // Without a team the lead is denied too.
    let actor = f.lead.clone();
    let mut d = draft(&f, IssueType::Task, "No team");
    d.team_id = None;
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
}

#[test]
fn create_rejects_team_from_another_project() {
    let mut f = fixture();
    let other_project = query::insert_project(&f.conn, "Ops", "OPS", None, NOW).expect("project");
    let lead_id = f.lead.id;
    let foreign_team =
        query::insert_team(&f.conn, other_project, "Oncall", Some(lead_id), NOW).expect("team");

    let actor = f.lead.clone();
    let mut d = draft(&f, IssueType::Task, "Crossed wires");
    d.team_id = Some(foreign_team);
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(
        err,
        CoreError::PermissionDenied(DenyReason::TeamProjectMismatch)
    ));
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[test]
fn subtask_requires_parent_and_story_does_not() {
    let mut f = fixture();

    let actor = f.lead.clone();
    let d = draft(&f, IssueType::Subtask, "Orphan");
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(err, CoreError::InvalidParent(_)));

    let d = draft(&f, IssueType::Story, "Free-floating");
    assert!(service::create_issue(&mut f.conn, &NullSink, &actor, &d).is_ok());
}

#[test]
fn bug_nests_under_story_or_task_only() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "Launch");
    let story = create(&mut f, IssueType::Story, "Signup");

    let actor = f.lead.clone();
    let mut d = draft(&f, IssueType::Bug, "Crash on submit");
    d.parent_id = Some(epic);
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(err, CoreError::InvalidParent(_)));

    d.parent_id = Some(story);
    assert!(service::create_issue(&mut f.conn, &NullSink, &actor, &d).is_ok());
}

#[test]
fn self_parenting_is_rejected_with_named_issue() {
    let mut f = fixture();
    let story = create(&mut f, IssueType::Story, "Signup");

    let actor = f.lead.clone();
    let err = service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(story)))
        .unwrap_err();
    assert!(matches!(err, CoreError::CircularDependency(_)));
    assert!(err.to_string().contains("own parent"), "message: {err}");
}

#[test]
fn ancestor_cycle_is_rejected() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "A");
    let story = create(&mut f, IssueType::Story, "B");
    let task = create(&mut f, IssueType::Task, "C");

    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(epic)))
        .expect("story under epic");
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &patch_parent(Some(story)))
        .expect("task under story");

    // Epic cannot take any parent, and even type-compatible moves into
    // the own subtree must fail on the cycle walk: reparent the story
    // under its own task's would-be story slot.
    let err = service::update_issue(&mut f.conn, &NullSink, &actor, epic, &patch_parent(Some(task)))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidParent(_) | CoreError::CircularDependency(_)
    ));

    // Same-type chain: story ← task; moving the story under its own
    // descendant trips the ancestor walk.
    let err =
        service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(task)))
            .unwrap_err();
    assert!(matches!(err, CoreError::CircularDependency(_)));
}

#[test]
fn available_parents_exclude_own_subtree() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "Launch");
    let story_a = create(&mut f, IssueType::Story, "A");
    let story_b = create(&mut f, IssueType::Story, "B");
    let task = create(&mut f, IssueType::Task, "T");

    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, story_a, &patch_parent(Some(epic)))
        .expect("attach a");
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &patch_parent(Some(story_a)))
        .expect("attach t");

    // A task looking for a story parent, while moving story_a's subtree
    // member `task`: both stories remain valid.
    let parents =
        service::list_available_parents(&f.conn, f.project_id, IssueType::Task, Some(task))
            .expect("parents");
    let ids: Vec<i64> = parents.iter().map(|p| p.id).collect();
    assert!(ids.contains(&story_a) && ids.contains(&story_b));

    // Moving story_a itself: no story offers for a task under it.
    let parents =
        service::list_available_parents(&f.conn, f.project_id, IssueType::Task, Some(story_a))
            .expect("parents");
    let ids: Vec<i64> = parents.iter().map(|p| p.id).collect();
    assert!(!ids.contains(&story_a));
    assert!(ids.contains(&story_b));
}

// ---------------------------------------------------------------------------
// Workflow gate
// ---------------------------------------------------------------------------

#[test]
fn done_blocked_until_children_done() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "Launch");
    let story = create(&mut f, IssueType::Story, "Signup");

    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(epic)))
        .expect("attach");
    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_status("In Progress"))
        .expect("start story");

    let err = service::update_issue(&mut f.conn, &NullSink, &actor, epic, &patch_status("Done"))
        .unwrap_err();
    assert!(matches!(err, CoreError::BlockedByChildren { pending: 1 }));
    assert!(err.to_string().contains('1'), "message: {err}");

    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_status("Done"))
        .expect("finish story");
    service::update_issue(&mut f.conn, &NullSink, &actor, epic, &patch_status("Done"))
        .expect("finish epic");
}

#[test]
fn done_gate_is_case_insensitive() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "Launch");
    let story = create(&mut f, IssueType::Story, "Signup");

    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(epic)))
        .expect("attach");

    let err = service::update_issue(&mut f.conn, &NullSink, &actor, epic, &patch_status("done"))
        .unwrap_err();
    assert!(matches!(err, CoreError::BlockedByChildren { .. }));
}

// ---------------------------------------------------------------------------
// Permissions on existing issues
// ---------------------------------------------------------------------------

#[test]
fn outsider_developer_cannot_update() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let actor = f.dev.clone();
    let err = service::update_issue(
        &mut f.conn,
        &NullSink,
        &actor,
        task,
        &IssuePatch {
            title: Some("Hijacked".to_string()),
            ..IssuePatch::default()
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CoreError::PermissionDenied(DenyReason::NotLeadOrAssignee)
    ));
}

#[test]
fn assignee_updates_but_cannot_delete() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let lead = f.lead.clone();
    let dev_id = f.dev.id;
    service::update_issue(
        &mut f.conn,
        &NullSink,
        &lead,
        task,
        &IssuePatch {
            assignee_id: Some(Some(dev_id)),
            ..IssuePatch::default()
        },
    )
    .expect("assign");

    let dev = f.dev.clone();
    service::update_issue(&mut f.conn, &NullSink, &dev, task, &patch_status("In Progress"))
        .expect("assignee may update");

    let err = service::delete_issue(&mut f.conn, &dev, task).unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(DenyReason::NotLead)));

    service::delete_issue(&mut f.conn, &lead, task).expect("lead may delete");
}

#[test]
fn lead_of_other_team_is_denied_in_same_project() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    // A second team in the same project led by a different user.
    let other_lead_id =
        query::insert_user(&f.conn, "omar", Role::Developer, ViewMode::Developer, false, NOW)
            .expect("user");
    query::insert_team(&f.conn, f.project_id, "Firmware", Some(other_lead_id), NOW).expect("team");
    let other_lead = query::get_user(&f.conn, other_lead_id)
        .expect("query")
        .expect("present");

    // Leading a team in the project grants view, not edit.
    assert!(service::get_issue(&f.conn, &other_lead, task).is_ok());
    let err = service::update_issue(&mut f.conn, &NullSink, &other_lead, task, &patch_status("Done"))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::PermissionDenied(DenyReason::NotLeadOrAssignee)
    ));
    let err = service::delete_issue(&mut f.conn, &other_lead, task).unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(DenyReason::NotLead)));
}

#[test]
fn missing_issue_reported_before_permission() {
    let mut f = fixture();
    create(&mut f, IssueType::Task, "Pump");

    let actor = f.dev.clone();
    let err = service::get_issue(&f.conn, &actor, 9999).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Issue)));

    let err = service::update_issue(&mut f.conn, &NullSink, &actor, 9999, &patch_status("Done"))
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Issue)));
}

// ---------------------------------------------------------------------------
// Project-active gate
// ---------------------------------------------------------------------------

#[test]
fn inactive_project_blocks_everyone_but_reactivation() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let master = f.master.clone();
    service::archive_project(&mut f.conn, &master, f.project_id).expect("archive");

    // Even the master admin cannot mutate while inactive.
    let err = service::update_issue(&mut f.conn, &NullSink, &master, task, &patch_status("Done"))
        .unwrap_err();
    assert!(matches!(err, CoreError::ProjectInactive));
    let err = service::delete_issue(&mut f.conn, &master, task).unwrap_err();
    assert!(matches!(err, CoreError::ProjectInactive));
    let actor = f.lead.clone();
    let d = draft(&f, IssueType::Task, "Blocked");
    let err = service::create_issue(&mut f.conn, &NullSink, &actor, &d).unwrap_err();
    assert!(matches!(err, CoreError::ProjectInactive));

    // Reads still work.
    assert!(service::get_issue(&f.conn, &master, task).is_ok());

    // Reactivation is the one accepted mutation, and unblocks the rest.
    service::reactivate_project(&mut f.conn, &master, f.project_id).expect("reactivate");
    service::update_issue(&mut f.conn, &NullSink, &master, task, &patch_status("Done"))
        .expect("update after reactivation");
}

#[test]
fn reactivation_requires_owner_or_admin() {
    let mut f = fixture();
    let master = f.master.clone();
    service::archive_project(&mut f.conn, &master, f.project_id).expect("archive");

    let dev = f.dev.clone();
    let err = service::reactivate_project(&mut f.conn, &dev, f.project_id).unwrap_err();
    assert!(matches!(
        err,
        CoreError::PermissionDenied(DenyReason::NotOwnerOrAdmin)
    ));
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[test]
fn title_change_writes_one_entry_and_noop_writes_none() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let actor = f.lead.clone();
    let rename = IssuePatch {
        title: Some("Pump v2".to_string()),
        ..IssuePatch::default()
    };
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &rename).expect("rename");

    let entries = service::get_activity(&f.conn, task).expect("activity");
    assert_eq!(entries.len(), 2, "created + one update");
    assert_eq!(entries[0].action, AuditAction::Updated);
    assert_eq!(entries[0].change_count, 1);
    assert!(entries[0].changes.contains("title: Pump -> Pump v2"));
    assert_eq!(entries[1].action, AuditAction::Created);

    // Submitting the identical title again records nothing.
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &rename).expect("noop");
    let entries = service::get_activity(&f.conn, task).expect("activity");
    assert_eq!(entries.len(), 2);
}

#[test]
fn whitespace_and_date_slices_do_not_register_as_changes() {
    let mut f = fixture();
    let actor = f.lead.clone();
    let mut d = draft(&f, IssueType::Task, "Pump");
    d.start_date = Some("2026-03-14".to_string());
    let task = service::create_issue(&mut f.conn, &NullSink, &actor, &d)
        .expect("create")
        .id;

    let patch = IssuePatch {
        title: Some("  Pump  ".to_string()),
        start_date: Some(Some("2026-03-14T00:00:00Z".to_string())),
        ..IssuePatch::default()
    };
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &patch).expect("noop");

    let entries = service::get_activity(&f.conn, task).expect("activity");
    assert_eq!(entries.len(), 1, "only the Created entry");
}

#[test]
fn created_entry_names_initial_status() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let entries = service::get_activity(&f.conn, task).expect("activity");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].changes, "Issue Created (status: Open)");
    assert_eq!(entries[0].change_count, 1);
}

#[test]
fn activity_for_missing_issue_is_not_found() {
    let f = fixture();
    let err = service::get_activity(&f.conn, 42).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Issue)));
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn status_priority_assignee_changes_notify_assignee() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let actor = f.lead.clone();
    let dev_id = f.dev.id;
    let patch = IssuePatch {
        status: Some("In Progress".to_string()),
        priority: Some("High".to_string()),
        assignee_id: Some(Some(dev_id)),
        ..IssuePatch::default()
    };
    service::update_issue(&mut f.conn, &StoreSink, &actor, task, &patch).expect("update");

    let unread = query::unread_notifications(&f.conn, dev_id).expect("query");
    let titles: Vec<&str> = unread.iter().map(|n| n.title.as_str()).collect();
    assert!(titles.contains(&"Status Updated"));
    assert!(titles.contains(&"Priority Updated"));
    assert!(titles.contains(&"Issue Assigned"));
}

#[test]
fn failing_sink_never_aborts_the_mutation() {
    struct FailingSink;
    impl NotificationSink for FailingSink {
        fn notify(&self, _: &Connection, _: i64, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let actor = f.lead.clone();
    let dev_id = f.dev.id;
    let patch = IssuePatch {
        status: Some("In Progress".to_string()),
        assignee_id: Some(Some(dev_id)),
        ..IssuePatch::default()
    };
    let updated =
        service::update_issue(&mut f.conn, &FailingSink, &actor, task, &patch).expect("update");
    assert_eq!(updated.status, "In Progress");
}

// ---------------------------------------------------------------------------
// Deletion cascade
// ---------------------------------------------------------------------------

#[test]
fn deleting_an_epic_removes_the_subtree() {
    let mut f = fixture();
    let epic = create(&mut f, IssueType::Epic, "Launch");
    let story = create(&mut f, IssueType::Story, "Signup");
    let task = create(&mut f, IssueType::Task, "Form");

    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, story, &patch_parent(Some(epic)))
        .expect("attach story");
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &patch_parent(Some(story)))
        .expect("attach task");

    service::delete_issue(&mut f.conn, &actor, epic).expect("delete epic");
    assert!(query::get_issue(&f.conn, story).expect("query").is_none());
    assert!(query::get_issue(&f.conn, task).expect("query").is_none());
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[test]
fn member_and_transitive_assignee_visibility() {
    let mut f = fixture();
    let task_a = create(&mut f, IssueType::Task, "A");
    let task_b = create(&mut f, IssueType::Task, "B");

    // devin sees nothing yet.
    let dev = f.dev.clone();
    assert!(matches!(
        service::get_issue(&f.conn, &dev, task_a).unwrap_err(),
        CoreError::PermissionDenied(DenyReason::NotVisible)
    ));

    // Assigning devin to task A grants task B too (assignee anywhere in
    // the project sees the whole project).
    let lead = f.lead.clone();
    let dev_id = f.dev.id;
    service::update_issue(
        &mut f.conn,
        &NullSink,
        &lead,
        task_a,
        &IssuePatch {
            assignee_id: Some(Some(dev_id)),
            ..IssuePatch::default()
        },
    )
    .expect("assign");

    assert!(service::get_issue(&f.conn, &dev, task_a).is_ok());
    assert!(service::get_issue(&f.conn, &dev, task_b).is_ok());

    let visible = service::list_visible_issues(&f.conn, &dev, None).expect("list");
    assert_eq!(visible.len(), 2);
}

#[test]
fn team_membership_grants_view_of_team_issues() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let member_id =
        query::insert_user(&f.conn, "mia", Role::Tester, ViewMode::Developer, false, NOW)
            .expect("user");
    query::add_team_member(&f.conn, f.team_id, member_id).expect("member");
    let member = query::get_user(&f.conn, member_id).expect("query").expect("present");

    assert!(service::get_issue(&f.conn, &member, task).is_ok());
    let visible = service::list_visible_issues(&f.conn, &member, Some(f.project_id)).expect("list");
    assert_eq!(visible.len(), 1);
}

#[test]
fn admin_view_mode_scopes_to_owned_projects() {
    let mut f = fixture();
    create(&mut f, IssueType::Task, "Pump");

    // A non-admin in admin view mode who owns no project sees nothing.
    let outsider_id =
        query::insert_user(&f.conn, "ava", Role::Developer, ViewMode::Admin, false, NOW)
            .expect("user");
    let outsider = query::get_user(&f.conn, outsider_id).expect("query").expect("present");
    let visible = service::list_visible_issues(&f.conn, &outsider, None).expect("list");
    assert!(visible.is_empty());

    // Admin role bypasses scope entirely.
    let master = f.master.clone();
    let visible = service::list_visible_issues(&f.conn, &master, None).expect("list");
    assert_eq!(visible.len(), 1);
}

#[test]
fn listing_a_missing_project_is_not_found() {
    let f = fixture();
    let master = f.master.clone();
    let err = service::list_visible_issues(&f.conn, &master, Some(404)).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Project)));
}

#[test]
fn stats_require_an_existing_project() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");
    let actor = f.lead.clone();
    service::update_issue(&mut f.conn, &NullSink, &actor, task, &patch_status("Done"))
        .expect("finish");

    let stats = service::project_stats(&f.conn, f.project_id).expect("stats");
    assert_eq!(stats.by_status.get("Done"), Some(&1));
    assert_eq!(stats.by_type.get("task"), Some(&1));

    let err = service::project_stats(&f.conn, 404).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Project)));
}

#[test]
fn assigned_listing_is_cross_project() {
    let mut f = fixture();
    let task = create(&mut f, IssueType::Task, "Pump");

    let lead = f.lead.clone();
    let dev_id = f.dev.id;
    service::update_issue(
        &mut f.conn,
        &NullSink,
        &lead,
        task,
        &IssuePatch {
            assignee_id: Some(Some(dev_id)),
            ..IssuePatch::default()
        },
    )
    .expect("assign");

    let dev = f.dev.clone();
    let assigned = service::list_assigned(&f.conn, &dev).expect("list");
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, task);
}
