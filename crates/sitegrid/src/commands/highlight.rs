//! Highlight command handlers. Highlights are local and need no remote.

use serde::Serialize;
use tabled::Tabled;

use sitegrid_core::SiteId;

use crate::cli::{GlobalOpts, HighlightArgs, HighlightCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Serialize)]
struct HighlightEntry {
    id: SiteId,
    /// From the cached snapshot; absent when the site is not cached.
    name: Option<String>,
    status: Option<String>,
}

#[derive(Tabled)]
struct HighlightRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn handle(args: HighlightArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::local(global)?;
    session.ctrl.load_cached();

    match args.command {
        HighlightCommand::Toggle { id } => {
            let id = SiteId::new(id);
            let on = session.ctrl.toggle_highlight(id);
            if !global.quiet {
                let label = session
                    .ctrl
                    .store()
                    .get(id)
                    .map_or_else(|| format!("Site {id}"), |s| s.name.clone());
                let state = if on { "highlighted" } else { "no longer highlighted" };
                eprintln!("{label} {state}");
            }
        }
        HighlightCommand::List => {
            let entries: Vec<HighlightEntry> = session
                .ctrl
                .highlights()
                .ids()
                .into_iter()
                .map(|id| {
                    let site = session.ctrl.store().get(id);
                    HighlightEntry {
                        id,
                        name: site.as_ref().map(|s| s.name.clone()),
                        status: site.as_ref().map(|s| s.status.display_token().to_owned()),
                    }
                })
                .collect();

            let out = output::render_list(
                &global.output,
                &entries,
                |e| HighlightRow {
                    id: e.id.to_string(),
                    name: e.name.clone().unwrap_or_default(),
                    status: e
                        .status
                        .as_deref()
                        .map(|s| output::paint_status(s, session.color))
                        .unwrap_or_default(),
                },
                |e| e.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
        }
    }

    session.finish();
    Ok(())
}
