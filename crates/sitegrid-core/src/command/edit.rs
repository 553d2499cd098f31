use serde::{Deserialize, Serialize};

use sitegrid_api::SiteUpdateBody;

use crate::model::{Site, SiteId, Status};

/// The operator-editable fields of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEdit {
    pub status: Status,
    pub phase: Option<u8>,
    pub notes: Option<String>,
}

impl SiteEdit {
    /// Capture the editable fields of `site`.
    pub fn of(site: &Site) -> Self {
        Self {
            status: site.status.clone(),
            phase: site.phase,
            notes: site.notes.clone(),
        }
    }

    /// Overwrite the editable fields of `site`.
    pub fn apply_to(&self, site: &mut Site) {
        site.status = self.status.clone();
        site.phase = self.phase;
        site.notes = self.notes.clone();
    }

    /// Wire body for the partial update, with the status in storage form.
    pub fn to_update_body(&self) -> SiteUpdateBody {
        SiteUpdateBody {
            status: self.status.storage_token().to_owned(),
            phase: self.phase,
            notes: self.notes.clone(),
        }
    }
}

/// What the edit panel currently holds, in display terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    /// Display status token (`VERDE`, `GIALLO`, ...).
    pub status: String,
    pub phase: Option<u8>,
    pub notes: String,
}

impl EditDraft {
    /// Start a draft from the site's current values.
    pub fn from_site(site: &Site) -> Self {
        Self {
            status: site.status.display_token().to_owned(),
            phase: site.phase,
            notes: site.notes.clone().unwrap_or_default(),
        }
    }

    /// Change the status. Leaving the in-progress statuses clears the phase.
    pub fn set_status(&mut self, display_token: &str) {
        self.status = display_token.to_owned();
        if !Status::from_display(display_token).allows_phase() {
            self.phase = None;
        }
    }

    /// Translate into storage values. Phase is dropped for statuses that
    /// do not carry one, phase 0 is absent, and blank notes are absent.
    pub fn resolve(&self) -> SiteEdit {
        let status = Status::from_display(&self.status);
        let phase = if status.allows_phase() {
            self.phase.filter(|p| *p > 0)
        } else {
            None
        };
        let notes = Some(self.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        SiteEdit { status, phase, notes }
    }
}

/// One optimistic edit: apply `after` now, restore `before` on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCommand {
    pub id: SiteId,
    pub before: SiteEdit,
    pub after: SiteEdit,
}

impl EditCommand {
    pub fn new(site: &Site, after: SiteEdit) -> Self {
        Self {
            id: site.id,
            before: SiteEdit::of(site),
            after,
        }
    }

    /// Whether applying the command would change anything.
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }

    pub fn commit_body(&self) -> SiteUpdateBody {
        self.after.to_update_body()
    }
}
