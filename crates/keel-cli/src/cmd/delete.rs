//! `kl delete` — delete a work item and its subtree.

use anyhow::Result;
use clap::Args;

use keel_core::service;

use crate::context::Ctx;
use crate::output::render_success;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue id.
    pub id: i64,
}

pub fn run_delete(args: &DeleteArgs, ctx: &mut Ctx, actor_flag: Option<&str>) -> Result<()> {
    let actor = ctx.resolve_actor(actor_flag)?;
    service::delete_issue(&mut ctx.conn, &actor, args.id).map_err(|e| ctx.fail(&e))?;
    render_success(ctx.output, "Story deleted successfully")
}

#[cfg(test)]
mod tests {
    use super::DeleteArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: DeleteArgs,
    }

    #[test]
    fn parses_id() {
        let w = Wrapper::parse_from(["test", "12"]);
        assert_eq!(w.args.id, 12);
    }
}
