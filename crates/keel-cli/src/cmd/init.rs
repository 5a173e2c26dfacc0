//! `kl init` — set up a keel workspace in the current directory.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use keel_core::config::{KeelConfig, CONFIG_FILE_NAME};
use keel_core::db::open_store;

use crate::output::{render_success, OutputMode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Store file path, relative to the workspace root.
    #[arg(long)]
    pub store: Option<String>,

    /// Disable notification persistence.
    #[arg(long)]
    pub no_notify: bool,
}

pub fn run_init(args: &InitArgs, root: &Path, output: OutputMode) -> Result<()> {
    let mut config = KeelConfig::default();
    if let Some(store) = &args.store {
        config.store.path = store.into();
    }
    config.notify.enabled = !args.no_notify;

    if root.join(CONFIG_FILE_NAME).exists() {
        render_success(output, "keel workspace already initialized")?;
        return Ok(());
    }

    config.save(root)?;
    drop(open_store(&config.store_path(root))?);
    render_success(output, "Initialized keel workspace")?;
    Ok(())
}
