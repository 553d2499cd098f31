//! Site command handlers.

use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use sitegrid_core::model::zone_numeral;
use sitegrid_core::{
    EditOutcome, EditorView, FilterParseError, FilterState, MarkerDescriptor, PhaseFilter, Site,
    SiteId, StarFilter, Status, StatusFilter, ZoneFilter,
};

use crate::cli::{GlobalOpts, SitesArgs, SitesCommand, SitesEditArgs, SitesListArgs};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

// ── Marker view ─────────────────────────────────────────────────────

/// One projected marker joined with the site it stands for.
#[derive(Debug, Serialize)]
struct MarkerView {
    id: SiteId,
    name: String,
    zone: u32,
    stars: Option<u8>,
    status: String,
    phase: Option<u8>,
    latitude: f64,
    longitude: f64,
    radius: f64,
    fill_color: String,
    highlighted: bool,
}

impl MarkerView {
    fn new(site: &Site, marker: &MarkerDescriptor, highlighted: bool) -> Self {
        Self {
            id: site.id,
            name: site.name.clone(),
            zone: site.zone,
            stars: site.star_rating,
            status: site.status.display_token().to_owned(),
            phase: site.phase,
            latitude: marker.position.lat,
            longitude: marker.position.lng,
            radius: marker.radius,
            fill_color: marker.style.fill_color.clone(),
            highlighted,
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Stars")]
    stars: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Radius")]
    radius: String,
    #[tabled(rename = "★")]
    highlighted: String,
}

impl MarkerRow {
    fn new(view: &MarkerView, color: bool) -> Self {
        Self {
            id: view.id.to_string(),
            name: view.name.clone(),
            zone: match view.zone {
                0 => String::new(),
                z => zone_numeral(z).map_or_else(|| z.to_string(), str::to_owned),
            },
            stars: view.stars.map(|s| s.to_string()).unwrap_or_default(),
            status: output::paint_status(&view.status, color),
            phase: view.phase.map(|p| p.to_string()).unwrap_or_default(),
            radius: format!("{:.1}", view.radius),
            highlighted: if view.highlighted { "★".into() } else { String::new() },
        }
    }
}

fn editor_detail(view: &EditorView, color: bool) -> String {
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".into());
    let mut pairs = vec![
        ("ID", view.id.to_string()),
        ("Name", view.name.clone()),
        ("Zone", opt(view.zone.clone())),
        ("Stars", opt(view.stars.map(|s| s.to_string()))),
        ("Status", output::paint_status(&view.status, color)),
    ];
    if view.show_phase_controls {
        pairs.push(("Phase", opt(view.phase.map(|p| p.to_string()))));
    }
    pairs.extend([
        ("Address", opt(view.address.clone())),
        ("Latitude", opt(view.latitude.clone())),
        ("Longitude", opt(view.longitude.clone())),
        ("Capacity", opt(view.capacity.map(|c| c.to_string()))),
        ("Highlighted", if view.highlighted { "yes".into() } else { "no".into() }),
        ("Notes", view.notes.clone()),
    ]);
    output::detail_lines(&pairs)
}

// ── Filter parsing ──────────────────────────────────────────────────

fn invalid_filter(e: &FilterParseError) -> CliError {
    CliError::Validation {
        field: e.kind.into(),
        reason: e.to_string(),
    }
}

fn parse_filter(args: &SitesListArgs) -> Result<FilterState, CliError> {
    let zone = args.zone.as_deref().map_or(ZoneFilter::All, ZoneFilter::parse);
    if zone == ZoneFilter::Zone(0) {
        return Err(CliError::Validation {
            field: "zone".into(),
            reason: format!("expected a zone number or numeral, got {:?}", args.zone.as_deref().unwrap_or_default()),
        });
    }

    let stars = match args.stars.as_deref() {
        Some(token) => token.parse::<StarFilter>().map_err(|e| invalid_filter(&e))?,
        None => StarFilter::All,
    };
    let status = match args.status.as_deref() {
        Some(token) => token.parse::<StatusFilter>().map_err(|e| invalid_filter(&e))?,
        None => StatusFilter::All,
    };
    let phase = match args.phase.as_deref() {
        Some(token) => token.parse::<PhaseFilter>().map_err(|e| invalid_filter(&e))?,
        None => PhaseFilter::All,
    };

    Ok(FilterState {
        zone,
        stars,
        status,
        phase,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SitesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SitesCommand::List(list) => handle_list(&list, global).await,
        SitesCommand::Show { id } => {
            let session = Session::remote(global)?;
            session.load().await?;
            let view = session.ctrl.open_editor(SiteId::new(id))?;
            session.ctrl.close_editor();

            let out = output::render_single(
                &global.output,
                &view,
                |v| editor_detail(v, session.color),
                |v| v.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            session.finish();
            Ok(())
        }
        SitesCommand::Edit(edit) => handle_edit(edit, global).await,
    }
}

async fn handle_list(args: &SitesListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filter = parse_filter(args)?;
    let session = Session::remote(global)?;
    session.load().await?;

    if let Some(zoom) = args.zoom {
        session.board.set_zoom(zoom);
    }
    session.ctrl.set_filter(filter);
    let projection = session.ctrl.project_now();
    debug!(
        total = projection.total,
        shown = projection.markers.len(),
        skipped = projection.skipped,
        "sites projected"
    );

    let store = session.ctrl.store();
    let views: Vec<MarkerView> = projection
        .markers
        .iter()
        .filter_map(|m| {
            let site = store.get(m.id)?;
            Some(MarkerView::new(&site, m, session.ctrl.is_highlighted(m.id)))
        })
        .collect();

    if projection.empty_zone.is_some() {
        if let Some(notice) = session.board.no_matches() {
            output::print_warning(&notice.to_string(), session.color);
        }
    }

    let out = output::render_list(
        &global.output,
        &views,
        |v| MarkerRow::new(v, session.color),
        |v| v.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    session.finish();
    Ok(())
}

async fn handle_edit(args: SitesEditArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if global.offline {
        return Err(CliError::Offline {
            operation: "sites edit".into(),
        });
    }
    let session = Session::remote(global)?;
    session.load().await?;

    let id = SiteId::new(args.id);
    let mut draft = session.ctrl.open_editor(id)?.draft();

    if let Some(ref token) = args.status {
        let Ok(status) = token.parse::<Status>();
        if !status.is_known() {
            return Err(CliError::Validation {
                field: "status".into(),
                reason: format!("unknown status {token:?}, expected VERDE, GIALLO, ROSSO or BIANCO"),
            });
        }
        draft.set_status(status.display_token());
    }
    if let Some(phase) = args.phase {
        if phase == 0 {
            return Err(CliError::Validation {
                field: "phase".into(),
                reason: "phase starts at 1".into(),
            });
        }
        if !Status::from_display(&draft.status).allows_phase() {
            output::print_warning(&format!("phase is ignored for status {}", draft.status), session.color);
        }
        draft.phase = Some(phase);
    }
    if args.clear_phase {
        draft.phase = None;
    }
    if let Some(notes) = args.notes {
        draft.notes = notes;
    }

    let pending = session
        .ctrl
        .submit_edit(&draft)?
        .ok_or_else(|| CliError::Internal("no site selected for editing".into()))?;
    debug!(site_id = %id, noop = pending.command.is_noop(), "edit submitted");

    match pending.outcome().await? {
        EditOutcome::Committed => {
            let site = session
                .ctrl
                .store()
                .get(id)
                .ok_or_else(|| CliError::NotFound { id: id.to_string() })?;
            let view = EditorView::new(&site, session.ctrl.is_highlighted(id));
            if !global.quiet {
                eprintln!("Saved {}", view.name);
            }
            let out = output::render_single(
                &global.output,
                &view,
                |v| editor_detail(v, session.color),
                |v| v.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            session.finish();
            Ok(())
        }
        EditOutcome::RolledBack { reason } => {
            session.board.take_notices();
            session.ctrl.take_warnings();
            session.ctrl.shutdown();
            let name = session
                .ctrl
                .store()
                .get(id)
                .map_or_else(|| id.to_string(), |s| s.name.clone());
            Err(CliError::EditRejected { name, reason })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn list_args(zone: Option<&str>, stars: Option<&str>, status: Option<&str>) -> SitesListArgs {
        SitesListArgs {
            zone: zone.map(str::to_owned),
            stars: stars.map(str::to_owned),
            status: status.map(str::to_owned),
            phase: None,
            zoom: None,
        }
    }

    #[test]
    fn filter_from_flags() {
        let filter = parse_filter(&list_args(Some("iv"), Some("4"), Some("giallo"))).unwrap();
        assert_eq!(filter.zone, ZoneFilter::Zone(4));
        assert_eq!(filter.stars, StarFilter::Exact(4));
        assert_eq!(filter.status, StatusFilter::Status(Status::Pending));
        assert_eq!(filter.phase, PhaseFilter::All);
    }

    #[test]
    fn no_flags_is_default_filter() {
        assert_eq!(parse_filter(&list_args(None, None, None)).unwrap(), FilterState::default());
    }

    #[test]
    fn bad_flags_are_usage_errors() {
        assert!(matches!(
            parse_filter(&list_args(Some("XX"), None, None)),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            parse_filter(&list_args(None, Some("6"), None)),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            parse_filter(&list_args(None, None, Some("purple"))),
            Err(CliError::Validation { .. })
        ));
    }
}
