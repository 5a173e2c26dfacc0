//! `kl stats` — issue counts for one project.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::service;

use crate::context::Ctx;
use crate::output::render;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Project id.
    #[arg(short, long)]
    pub project: i64,
}

pub fn run_stats(args: &StatsArgs, ctx: &Ctx) -> Result<()> {
    let stats = service::project_stats(&ctx.conn, args.project).map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &stats, |stats, w| {
        let mut section = |name: &str, counts: &std::collections::HashMap<String, usize>| {
            writeln!(w, "{name}")?;
            let mut entries: Vec<_> = counts.iter().collect();
            entries.sort();
            for (key, count) in entries {
                writeln!(w, "  {key:<16} {count}")?;
            }
            Ok::<(), std::io::Error>(())
        };
        section("by status", &stats.by_status)?;
        section("by type", &stats.by_type)?;
        section("by priority", &stats.by_priority)?;
        Ok(())
    })
}
