//! `kl parents` — valid parent choices for an issue type.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::str::FromStr;

use keel_core::model::issue::IssueType;
use keel_core::service;

use crate::context::Ctx;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ParentsArgs {
    /// Project id.
    #[arg(short, long)]
    pub project: i64,

    /// Issue type looking for a parent.
    #[arg(short = 'k', long = "type")]
    pub issue_type: String,

    /// Exclude this issue's subtree (when moving an existing item).
    #[arg(long)]
    pub exclude: Option<i64>,
}

pub fn run_parents(args: &ParentsArgs, ctx: &Ctx) -> Result<()> {
    let issue_type = IssueType::from_str(&args.issue_type)?;
    let parents =
        service::list_available_parents(&ctx.conn, args.project, issue_type, args.exclude)
            .map_err(|e| ctx.fail(&e))?;

    render(ctx.output, &parents, |parents, w| {
        for p in parents {
            writeln!(w, "{:<10} {:<8} {:<14} {}", p.code, p.issue_type, p.status, p.title)?;
        }
        if parents.is_empty() {
            writeln!(w, "no valid parents")?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::ParentsArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ParentsArgs,
    }

    #[test]
    fn requires_project_and_type() {
        let w = Wrapper::parse_from(["test", "--project", "1", "--type", "story"]);
        assert_eq!(w.args.issue_type, "story");
        assert!(Wrapper::try_parse_from(["test", "--project", "1"]).is_err());
    }
}
