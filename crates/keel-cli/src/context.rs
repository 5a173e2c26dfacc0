//! Shared command context: config, store connection, actor resolution.

use anyhow::{bail, Context as AnyhowContext, Result};
use rusqlite::Connection;
use std::path::Path;

use keel_core::config::KeelConfig;
use keel_core::db::{open_store, query};
use keel_core::error::CoreError;
use keel_core::model::actor::Actor;
use keel_core::notify::{NotificationSink, NullSink, StoreSink};

use crate::output::{render_error, CliError, OutputMode};

/// Everything a command handler needs.
pub struct Ctx {
    pub conn: Connection,
    pub config: KeelConfig,
    pub output: OutputMode,
}

impl Ctx {
    /// Load config from `root` and open the store it points at.
    ///
    /// # Errors
    ///
    /// Returns an error when config parsing or the store open fails.
    pub fn open(root: &Path, output: OutputMode) -> Result<Self> {
        let config = KeelConfig::load(root)?;
        let conn = open_store(&config.store_path(root))?;
        Ok(Self {
            conn,
            config,
            output,
        })
    }

    /// The notification sink the config selects.
    #[must_use]
    pub fn sink(&self) -> Box<dyn NotificationSink> {
        if self.config.notify.enabled {
            Box::new(StoreSink)
        } else {
            Box::new(NullSink)
        }
    }

    /// Resolve the acting user from `--actor` or the `KEEL_ACTOR` env
    /// var.
    ///
    /// # Errors
    ///
    /// Returns an error when no actor is named or the name is unknown.
    pub fn resolve_actor(&self, flag: Option<&str>) -> Result<Actor> {
        let name = match flag {
            Some(name) => name.to_string(),
            None => std::env::var("KEEL_ACTOR")
                .context("no acting user: pass --actor or set KEEL_ACTOR")?,
        };
        match query::get_user_by_username(&self.conn, &name)? {
            Some(actor) => Ok(actor),
            None => bail!("unknown user '{name}'"),
        }
    }

    /// Report a core error in the selected output mode and convert it
    /// for the process exit path.
    pub fn fail(&self, error: &CoreError) -> anyhow::Error {
        render_error(
            self.output,
            &CliError {
                error: &error.to_string(),
                code: error.code(),
            },
        );
        anyhow::anyhow!("{error}")
    }
}
