//! `kl project` — project seeding plus the archive/reactivate gate.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::io::Write;

use keel_core::db::query;
use keel_core::service;

use crate::context::Ctx;
use crate::output::{render, render_success};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Add a project.
    Add(ProjectAddArgs),
    /// List all projects.
    List,
    /// Archive a project (makes it read-only).
    Archive(ProjectIdArgs),
    /// Reactivate an archived project.
    Reactivate(ProjectIdArgs),
}

#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Unique project name.
    pub name: String,

    /// Issue-code prefix; defaults to the first two name characters.
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Owning user id.
    #[arg(long)]
    pub owner: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ProjectIdArgs {
    /// Project id.
    pub id: i64,
}

pub fn run_project(command: &ProjectCommand, ctx: &mut Ctx, actor_flag: Option<&str>) -> Result<()> {
    match command {
        ProjectCommand::Add(args) => {
            let id = query::insert_project(
                &ctx.conn,
                &args.name,
                &args.prefix,
                args.owner,
                &keel_core::now(),
            )?;
            render_success(ctx.output, &format!("Added project {} (id {id})", args.name))
        }
        ProjectCommand::List => {
            let projects = query::list_projects(&ctx.conn)?;
            render(ctx.output, &projects, |projects, w| {
                for p in projects {
                    let state = if p.is_active { "active" } else { "archived" };
                    writeln!(w, "{:>4}  {:<20} {:<6} {state}", p.id, p.name, p.prefix)?;
                }
                Ok(())
            })
        }
        ProjectCommand::Archive(args) => {
            let actor = ctx.resolve_actor(actor_flag)?;
            service::archive_project(&mut ctx.conn, &actor, args.id)
                .map_err(|e| ctx.fail(&e))?;
            render_success(ctx.output, "Project archived successfully")
        }
        ProjectCommand::Reactivate(args) => {
            let actor = ctx.resolve_actor(actor_flag)?;
            service::reactivate_project(&mut ctx.conn, &actor, args.id)
                .map_err(|e| ctx.fail(&e))?;
            render_success(ctx.output, "Project reactivated")
        }
    }
}
