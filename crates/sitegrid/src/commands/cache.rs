//! Cache command handlers.

use std::time::Duration;

use serde::Serialize;

use sitegrid_core::{FileStore, SITES_CACHE_KEY};

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Serialize)]
struct CacheStatus {
    path: String,
    present: bool,
    captured_at: Option<String>,
    age: Option<String>,
    fresh: bool,
    sites: usize,
    highlighted: usize,
    staleness: String,
}

fn human(d: Duration) -> String {
    humantime::format_duration(Duration::from_secs(d.as_secs())).to_string()
}

fn status_detail(s: &CacheStatus) -> String {
    let freshness = match (s.present, s.fresh) {
        (false, _) => "empty",
        (true, true) => "fresh",
        (true, false) => "stale",
    };
    output::detail_lines(&[
        ("Path", s.path.clone()),
        ("State", freshness.into()),
        ("Captured", s.captured_at.clone().unwrap_or_else(|| "-".into())),
        ("Age", s.age.clone().unwrap_or_else(|| "-".into())),
        ("Sites", s.sites.to_string()),
        ("Highlighted", s.highlighted.to_string()),
        ("Stale after", s.staleness.clone()),
    ])
}

pub fn handle(args: CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::local(global)?;
    let cache = session.ctrl.cache();

    match args.command {
        CacheCommand::Status => {
            let snapshot = cache.read()?;
            let path = FileStore::new(&session.data_dir).path_for(SITES_CACHE_KEY);
            let status = CacheStatus {
                path: path.display().to_string(),
                present: snapshot.is_some(),
                captured_at: snapshot.as_ref().map(|s| s.captured_at.to_rfc3339()),
                age: snapshot.as_ref().map(|s| human(s.age)),
                fresh: snapshot.as_ref().is_some_and(|s| s.fresh),
                sites: snapshot.as_ref().map_or(0, |s| s.sites.len()),
                highlighted: session.ctrl.highlights().len(),
                staleness: human(cache.staleness()),
            };
            let out = output::render_single(&global.output, &status, status_detail, |s| {
                s.sites.to_string()
            })?;
            output::print_output(&out, global.quiet);
        }
        CacheCommand::Clear => {
            cache.clear()?;
            if !global.quiet {
                eprintln!("Site cache cleared");
            }
        }
    }

    session.finish();
    Ok(())
}
