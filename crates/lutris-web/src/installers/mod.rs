//! Installer scripts: parsing, shape validation, corpus fixes and the moderation workflow.

pub mod domain;
pub mod fixes;
pub mod memory;
pub mod moderation;
pub mod repository;
pub mod router;
pub mod script;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{installer_slug, Installer, InstallerDocument, InstallerId};
pub use fixes::{fix_set, CleanupReport, FixKind, FixOutcome, InstallerCleaner, InstallerFix};
pub use memory::{
    InMemoryHistoryRepository, InMemoryInstallerRepository, InMemoryNotifier,
    InMemoryRevisionRepository,
};
pub use moderation::{
    Actor, DraftRequest, DraftSave, HistoryEntry, InstallerRevision, ModerationError,
    ModerationService, RevisionId, RevisionStatus,
};
pub use repository::{
    HistoryRepository, InstallerRepository, ModerationEvent, ModerationEventKind,
    ModerationNotifier, NotifyError, RepositoryError, RevisionRepository,
};
pub use router::installer_router;
pub use script::{InstallerScript, ScriptError};
pub use validation::{
    validate_installer, InstallerValidator, ValidationConfig, ValidationIssue, ValidationReport,
};
