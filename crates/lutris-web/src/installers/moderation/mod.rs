//! Draft -> submission -> accepted/rejected workflow for community installer changes.

mod revision;
mod service;

pub use revision::{
    Actor, DraftRequest, HistoryEntry, InstallerRevision, ModerationAction, RevisionId,
    RevisionStatus, RevisionSummaryView,
};
pub use service::{DraftSave, ModerationError, ModerationService};
