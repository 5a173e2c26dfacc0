//! `kl create` — create a new work item.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::str::FromStr;

use keel_core::model::issue::{IssueDraft, IssueType};
use keel_core::service;

use crate::context::Ctx;
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new item.
    #[arg(short, long)]
    pub title: String,

    /// Project id.
    #[arg(short, long)]
    pub project: i64,

    /// Team id (team leads must name their own team).
    #[arg(long)]
    pub team: Option<i64>,

    /// Issue type: epic, story, task, bug, or subtask.
    #[arg(short = 'k', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Parent issue id.
    #[arg(long)]
    pub parent: Option<i64>,

    /// Description text.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Initial status.
    #[arg(long, default_value = "Open")]
    pub status: String,

    /// Priority.
    #[arg(long)]
    pub priority: Option<String>,

    /// Assignee user id.
    #[arg(long)]
    pub assignee: Option<i64>,

    /// Reviewer name.
    #[arg(long)]
    pub reviewer: Option<String>,

    /// Sprint label.
    #[arg(long)]
    pub sprint: Option<String>,

    /// Release label.
    #[arg(long)]
    pub release: Option<String>,

    /// Planned start date (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: Option<String>,

    /// Planned end date (YYYY-MM-DD).
    #[arg(long)]
    pub end_date: Option<String>,
}

pub fn run_create(args: &CreateArgs, ctx: &mut Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    let issue_type = IssueType::from_str(&args.issue_type)?;

    let draft = IssueDraft {
        project_id: args.project,
        team_id: args.team,
        issue_type,
        parent_id: args.parent,
        title: args.title.clone(),
        description: args.description.clone().unwrap_or_default(),
        status: args.status.clone(),
        priority: args.priority.clone(),
        assignee_id: args.assignee,
        reviewer: args.reviewer.clone(),
        sprint: args.sprint.clone(),
        release: args.release.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
    };

    let sink = ctx.sink();
    let item = service::create_issue(&mut ctx.conn, sink.as_ref(), &actor, &draft)
        .map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &item, |item, w| {
        writeln!(w, "Created {} ({})", item.code, item.issue_type)?;
        pretty_kv(w, "id", item.id.to_string())?;
        pretty_kv(w, "title", &item.title)?;
        pretty_kv(w, "status", &item.status)
    })
}
