// ── Edit commands ──
//
// An operator edit is captured as a command holding the state before and
// after. `after` is applied immediately; `before` is re-applied through
// the same store setter if the remote commit fails.

mod edit;

pub use edit::{EditCommand, EditDraft, SiteEdit};
