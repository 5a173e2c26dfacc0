//! `kl activity` — the audit trail for one work item.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::service;

use crate::context::Ctx;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Issue id.
    pub id: i64,
}

pub fn run_activity(args: &ActivityArgs, ctx: &Ctx) -> Result<()> {
    let entries = service::get_activity(&ctx.conn, args.id).map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &entries, |entries, w| {
        for entry in entries {
            let actor = entry
                .actor_id
                .map_or_else(|| "unknown".to_string(), |id| format!("user {id}"));
            writeln!(
                w,
                "{}  {}  {} ({} change{})",
                entry.created_at,
                entry.action,
                actor,
                entry.change_count,
                if entry.change_count == 1 { "" } else { "s" }
            )?;
            for line in entry.changes.lines() {
                writeln!(w, "    {line}")?;
            }
        }
        Ok(())
    })
}
