use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::{FixOutcome, InstallerFix};
use crate::installers::domain::Installer;
use crate::installers::moderation::HistoryEntry;
use crate::installers::repository::{HistoryRepository, InstallerRepository, RepositoryError};

const CLEANUP_AUTHOR: &str = "installer-cleanup";

/// Runs a set of fixes over every stored installer, one record at a time.
pub struct InstallerCleaner<I, H> {
    installers: Arc<I>,
    history: Arc<H>,
    fixes: Vec<Box<dyn InstallerFix>>,
    dry_run: bool,
}

impl<I, H> InstallerCleaner<I, H>
where
    I: InstallerRepository + 'static,
    H: HistoryRepository + 'static,
{
    pub fn new(installers: Arc<I>, history: Arc<H>, fixes: Vec<Box<dyn InstallerFix>>) -> Self {
        Self {
            installers,
            history,
            fixes,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Failures on one installer are logged and counted; the batch always continues.
    pub fn run(&self) -> Result<CleanupReport, RepositoryError> {
        let mut installers = self.installers.list()?;
        installers.sort_by_key(|installer| installer.id);

        let mut report = CleanupReport {
            dry_run: self.dry_run,
            ..CleanupReport::default()
        };

        for original in installers {
            report.examined += 1;
            if let Some(change) = self.clean_one(&original, &mut report) {
                report.changed.push(change);
            }
        }

        info!(
            examined = report.examined,
            changed = report.changed.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            dry_run = self.dry_run,
            "installer cleanup finished"
        );
        Ok(report)
    }

    fn clean_one(&self, original: &Installer, report: &mut CleanupReport) -> Option<CleanupChange> {
        let mut working = original.clone();
        let mut applied = Vec::new();
        let mut changes = Vec::new();

        for fix in &self.fixes {
            match fix.apply(&mut working) {
                Ok(FixOutcome::Changed(mut fix_changes)) => {
                    applied.push(fix.name());
                    changes.append(&mut fix_changes);
                }
                Ok(FixOutcome::Unchanged) => {}
                Ok(FixOutcome::Skipped(reason)) => {
                    report.skipped.push(CleanupSkip {
                        slug: original.slug.clone(),
                        fix: fix.name(),
                        reason,
                    });
                }
                Err(err) => {
                    warn!(installer = %original.slug, fix = fix.name(), error = %err, "fix failed");
                    report.failures.push(CleanupFailure {
                        slug: original.slug.clone(),
                        reason: format!("{}: {err}", fix.name()),
                    });
                    return None;
                }
            }
        }

        if applied.is_empty() {
            return None;
        }

        if !self.dry_run {
            if let Err(err) = self.persist(original, working, &applied) {
                warn!(installer = %original.slug, error = %err, "could not save cleaned installer");
                report.failures.push(CleanupFailure {
                    slug: original.slug.clone(),
                    reason: err.to_string(),
                });
                return None;
            }
        }

        Some(CleanupChange {
            slug: original.slug.clone(),
            fixes: applied,
            changes,
        })
    }

    fn persist(
        &self,
        original: &Installer,
        cleaned: Installer,
        applied: &[&'static str],
    ) -> Result<(), RepositoryError> {
        self.installers.update(cleaned)?;

        // History only holds snapshots of changes that were saved.
        let snapshot = HistoryEntry::snapshot_of(
            original,
            CLEANUP_AUTHOR,
            format!("fix: {}", applied.join(", ")),
        );
        if let Err(err) = self.history.record(snapshot) {
            if let Err(restore_err) = self.installers.update(original.clone()) {
                warn!(installer = %original.slug, error = %restore_err, "could not restore installer");
            }
            return Err(err);
        }
        Ok(())
    }
}

/// Installer modified by a cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupChange {
    pub slug: String,
    pub fixes: Vec<&'static str>,
    pub changes: Vec<String>,
}

/// Fix that declined to touch an installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupSkip {
    pub slug: String,
    pub fix: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub slug: String,
    pub reason: String,
}

/// Summary of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub examined: usize,
    pub changed: Vec<CleanupChange>,
    pub skipped: Vec<CleanupSkip>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn summary(&self) -> String {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        format!(
            "examined {} installer(s){mode}: {} changed, {} skipped, {} failed",
            self.examined,
            self.changed.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}
