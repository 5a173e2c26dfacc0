//! `kl inbox` — unread notifications for the acting user.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use keel_core::db::query;

use crate::context::Ctx;
use crate::output::{render, render_success};

#[derive(Args, Debug)]
pub struct InboxArgs {
    /// Mark everything read after printing.
    #[arg(long)]
    pub ack: bool,
}

pub fn run_inbox(args: &InboxArgs, ctx: &Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    let unread = query::unread_notifications(&ctx.conn, actor.id)?;

    render(ctx.output, &unread, |unread, w| {
        for n in unread {
            writeln!(w, "{}  {}: {}", n.created_at, n.title, n.message)?;
        }
        if unread.is_empty() {
            writeln!(w, "inbox empty")?;
        }
        Ok(())
    })?;

    if args.ack {
        for n in &unread {
            query::mark_notification_read(&ctx.conn, n.id)?;
        }
        render_success(ctx.output, &format!("Marked {} read", unread.len()))?;
    }
    Ok(())
}
