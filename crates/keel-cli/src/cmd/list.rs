//! `kl list` — work items visible to the acting user.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::service;

use crate::context::Ctx;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one project.
    #[arg(short, long)]
    pub project: Option<i64>,

    /// Only issues assigned to the acting user.
    #[arg(long)]
    pub assigned: bool,
}

pub fn run_list(args: &ListArgs, ctx: &Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    let items = if args.assigned {
        service::list_assigned(&ctx.conn, &actor).map_err(|e| ctx.fail(&e))?
    } else {
        service::list_visible_issues(&ctx.conn, &actor, args.project).map_err(|e| ctx.fail(&e))?
    };

    render(ctx.output, &items, |items, w| {
        for item in items {
            writeln!(
                w,
                "{:<10} {:<8} {:<14} {}",
                item.code, item.issue_type, item.status, item.title
            )?;
        }
        if items.is_empty() {
            writeln!(w, "no visible issues")?;
        }
        Ok(())
    })
}
