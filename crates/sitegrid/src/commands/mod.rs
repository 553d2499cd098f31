//! Command dispatch: bridges CLI args -> controller operations -> output.

pub mod cache;
pub mod config_cmd;
pub mod highlight;
pub mod sites;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a site-state command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Sites(args) => sites::handle(args, global).await,
        Command::Highlight(args) => highlight::handle(args, global),
        Command::Cache(args) => cache::handle(args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not touch site state".into(),
        )),
    }
}
