//! `kl show` — full details for one work item.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::service;

use crate::context::Ctx;
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id.
    pub id: i64,
}

pub fn run_show(args: &ShowArgs, ctx: &Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    let item = service::get_issue(&ctx.conn, &actor, args.id).map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &item, |item, w| {
        writeln!(w, "{}  {}", item.code, item.title)?;
        pretty_kv(w, "type", item.issue_type.to_string())?;
        pretty_kv(w, "status", &item.status)?;
        pretty_kv(w, "priority", &item.priority)?;
        pretty_kv(
            w,
            "assignee",
            item.assignee_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        )?;
        pretty_kv(
            w,
            "parent",
            item.parent_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        )?;
        if !item.description.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", item.description)?;
        }
        Ok(())
    })
}
