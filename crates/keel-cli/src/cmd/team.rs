//! `kl team` — team seeding and membership.

use anyhow::Result;
use clap::{Args, Subcommand};

use keel_core::db::query;

use crate::context::Ctx;
use crate::output::render_success;

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Add a team to a project.
    Add(TeamAddArgs),
    /// Add a user to a team.
    Member(TeamMemberArgs),
}

#[derive(Args, Debug)]
pub struct TeamAddArgs {
    /// Team name.
    pub name: String,

    /// Project id the team belongs to.
    #[arg(long)]
    pub project: i64,

    /// Lead user id.
    #[arg(long)]
    pub lead: Option<i64>,
}

#[derive(Args, Debug)]
pub struct TeamMemberArgs {
    /// Team id.
    pub team: i64,

    /// User id to add.
    pub user: i64,
}

pub fn run_team(command: &TeamCommand, ctx: &Ctx) -> Result<()> {
    match command {
        TeamCommand::Add(args) => {
            let id = query::insert_team(
                &ctx.conn,
                args.project,
                &args.name,
                args.lead,
                &keel_core::now(),
            )?;
            render_success(ctx.output, &format!("Added team {} (id {id})", args.name))
        }
        TeamCommand::Member(args) => {
            query::add_team_member(&ctx.conn, args.team, args.user)?;
            render_success(
                ctx.output,
                &format!("Added user {} to team {}", args.user, args.team),
            )
        }
    }
}
