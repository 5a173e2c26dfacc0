//! `kl update` — patch fields on an existing work item.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::model::issue::IssuePatch;
use keel_core::service;

use crate::context::Ctx;
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue id.
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    /// Move to a team.
    #[arg(long, conflicts_with = "no_team")]
    pub team: Option<i64>,

    /// Detach from its team.
    #[arg(long)]
    pub no_team: bool,

    /// Assign to a user.
    #[arg(long, conflicts_with = "unassign")]
    pub assignee: Option<i64>,

    /// Clear the assignee.
    #[arg(long)]
    pub unassign: bool,

    /// Move under a parent issue.
    #[arg(long, conflicts_with = "no_parent")]
    pub parent: Option<i64>,

    /// Detach from its parent.
    #[arg(long)]
    pub no_parent: bool,

    #[arg(long)]
    pub reviewer: Option<String>,

    #[arg(long)]
    pub sprint: Option<String>,

    #[arg(long)]
    pub release: Option<String>,

    #[arg(long)]
    pub start_date: Option<String>,

    #[arg(long)]
    pub end_date: Option<String>,
}

impl UpdateArgs {
    fn to_patch(&self) -> IssuePatch {
        let tri = |set: Option<i64>, clear: bool| match (set, clear) {
            (Some(v), _) => Some(Some(v)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        IssuePatch {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            team_id: tri(self.team, self.no_team),
            assignee_id: tri(self.assignee, self.unassign),
            parent_id: tri(self.parent, self.no_parent),
            reviewer: self.reviewer.clone().map(Some),
            sprint: self.sprint.clone().map(Some),
            release: self.release.clone().map(Some),
            start_date: self.start_date.clone().map(Some),
            end_date: self.end_date.clone().map(Some),
        }
    }
}

pub fn run_update(args: &UpdateArgs, ctx: &mut Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    let patch = args.to_patch();

    let sink = ctx.sink();
    let item = service::update_issue(&mut ctx.conn, sink.as_ref(), &actor, args.id, &patch)
        .map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &item, |item, w| {
        writeln!(w, "Updated {}", item.code)?;
        pretty_kv(w, "title", &item.title)?;
        pretty_kv(w, "status", &item.status)?;
        pretty_kv(w, "priority", &item.priority)
    })
}
