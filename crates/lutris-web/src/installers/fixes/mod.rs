//! Batch transformations applied across the installer corpus.
//!
//! Every fix is idempotent: running it a second time on its own output reports `Unchanged`.

mod arch;
mod cleaner;
mod wine_versions;
mod winesteam;

pub use arch::FixWineArch;
pub use cleaner::{CleanupChange, CleanupFailure, CleanupReport, CleanupSkip, InstallerCleaner};
pub use wine_versions::RemoveDeprecatedWine;
pub use winesteam::WinesteamToProton;

use std::fmt;

use super::domain::Installer;
use super::script::ScriptError;
use super::validation::ValidationConfig;

/// One named transformation over a single installer.
pub trait InstallerFix: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, installer: &mut Installer) -> Result<FixOutcome, FixError>;
}

/// What a fix did to an installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    Changed(Vec<String>),
    Unchanged,
    Skipped(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Selectable fixes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixKind {
    RemoveDeprecatedWine,
    WinesteamToProton,
    WineArch,
}

impl FixKind {
    pub fn all() -> [FixKind; 3] {
        [
            FixKind::RemoveDeprecatedWine,
            FixKind::WinesteamToProton,
            FixKind::WineArch,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FixKind::RemoveDeprecatedWine => "remove-deprecated-wine",
            FixKind::WinesteamToProton => "winesteam-to-proton",
            FixKind::WineArch => "wine-arch",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::all().into_iter().find(|kind| kind.name() == raw)
    }

    pub fn build(&self, config: &ValidationConfig) -> Box<dyn InstallerFix> {
        match self {
            FixKind::RemoveDeprecatedWine => Box::new(RemoveDeprecatedWine::new(config)),
            FixKind::WinesteamToProton => Box::new(WinesteamToProton),
            FixKind::WineArch => Box::new(FixWineArch::new(config)),
        }
    }
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the fixes for `kinds` in canonical order; an empty selection means every fix.
pub fn fix_set(kinds: &[FixKind], config: &ValidationConfig) -> Vec<Box<dyn InstallerFix>> {
    FixKind::all()
        .into_iter()
        .filter(|kind| kinds.is_empty() || kinds.contains(kind))
        .map(|kind| kind.build(config))
        .collect()
}
