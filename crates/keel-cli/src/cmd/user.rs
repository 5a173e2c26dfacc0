//! `kl user` — identity seeding. The core consumes these rows; it never
//! creates them.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::str::FromStr;

use keel_core::db::query;
use keel_core::model::actor::{Role, ViewMode};

use crate::context::Ctx;
use crate::output::render_success;

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add a user.
    Add(UserAddArgs),
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    /// Unique username.
    pub name: String,

    /// Role: admin, developer, tester, or other.
    #[arg(long, default_value = "developer")]
    pub role: String,

    /// View mode: admin or developer.
    #[arg(long, default_value = "developer")]
    pub view_mode: String,

    /// Provision this account as the master admin.
    #[arg(long)]
    pub master: bool,
}

pub fn run_user(command: &UserCommand, ctx: &Ctx) -> Result<()> {
    match command {
        UserCommand::Add(args) => {
            let role = Role::from_str(&args.role)?;
            let view_mode = ViewMode::from_str(&args.view_mode)?;
            let id = query::insert_user(
                &ctx.conn,
                &args.name,
                role,
                view_mode,
                args.master,
                &keel_core::now(),
            )?;
            render_success(ctx.output, &format!("Added user {} (id {id})", args.name))
        }
    }
}
