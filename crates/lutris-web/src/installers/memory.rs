//! Mutex-backed stores used by the service binary and by tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use super::domain::{Installer, InstallerId};
use super::moderation::{HistoryEntry, InstallerRevision, RevisionId, RevisionStatus};
use super::repository::{
    HistoryRepository, InstallerRepository, ModerationEvent, ModerationNotifier, NotifyError,
    RepositoryError, RevisionRepository,
};
use crate::catalog::GameSlug;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

#[derive(Default, Clone)]
pub struct InMemoryInstallerRepository {
    records: Arc<Mutex<BTreeMap<InstallerId, Installer>>>,
    sequence: Arc<AtomicU64>,
}

impl InstallerRepository for InMemoryInstallerRepository {
    fn next_id(&self) -> Result<InstallerId, RepositoryError> {
        Ok(InstallerId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn insert(&self, installer: Installer) -> Result<Installer, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let slug_taken = guard.values().any(|existing| existing.slug == installer.slug);
        if guard.contains_key(&installer.id) || slug_taken {
            return Err(RepositoryError::Conflict);
        }
        self.sequence.fetch_max(installer.id.0, Ordering::Relaxed);
        guard.insert(installer.id, installer.clone());
        Ok(installer)
    }

    fn update(&self, installer: Installer) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&installer.id) {
            Some(existing) => {
                *existing = installer;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: InstallerId) -> Result<Option<Installer>, RepositoryError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Installer>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .find(|installer| installer.slug == slug)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Installer>, RepositoryError> {
        Ok(lock(&self.records)?.values().cloned().collect())
    }

    fn for_game(&self, game: &GameSlug) -> Result<Vec<Installer>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|installer| &installer.game_slug == game)
            .cloned()
            .collect())
    }

    fn slugs(&self) -> Result<HashSet<String>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .map(|installer| installer.slug.clone())
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRevisionRepository {
    records: Arc<Mutex<BTreeMap<RevisionId, InstallerRevision>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryRevisionRepository {
    fn filtered(
        &self,
        predicate: impl Fn(&InstallerRevision) -> bool,
    ) -> Result<Vec<InstallerRevision>, RepositoryError> {
        Ok(lock(&self.records)?
            .values()
            .filter(|revision| predicate(revision))
            .cloned()
            .collect())
    }
}

impl RevisionRepository for InMemoryRevisionRepository {
    fn next_id(&self) -> Result<RevisionId, RepositoryError> {
        Ok(RevisionId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn insert(&self, revision: InstallerRevision) -> Result<InstallerRevision, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&revision.id) {
            return Err(RepositoryError::Conflict);
        }
        self.sequence.fetch_max(revision.id.0, Ordering::Relaxed);
        guard.insert(revision.id, revision.clone());
        Ok(revision)
    }

    fn update(&self, revision: InstallerRevision) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&revision.id) {
            Some(existing) => {
                *existing = revision;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: RevisionId) -> Result<Option<InstallerRevision>, RepositoryError> {
        Ok(lock(&self.records)?.get(&id).cloned())
    }

    fn delete(&self, id: RevisionId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn with_status(&self, status: RevisionStatus) -> Result<Vec<InstallerRevision>, RepositoryError> {
        self.filtered(|revision| revision.status == status)
    }

    fn by_author(&self, author: &str) -> Result<Vec<InstallerRevision>, RepositoryError> {
        self.filtered(|revision| revision.author == author)
    }

    fn for_installer(&self, id: InstallerId) -> Result<Vec<InstallerRevision>, RepositoryError> {
        self.filtered(|revision| revision.installer_id == Some(id))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryHistoryRepository {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl HistoryRepository for InMemoryHistoryRepository {
    fn record(&self, entry: HistoryEntry) -> Result<(), RepositoryError> {
        lock(&self.entries)?.push(entry);
        Ok(())
    }

    fn for_installer(&self, id: InstallerId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        Ok(lock(&self.entries)?
            .iter()
            .filter(|entry| entry.installer_id == id)
            .cloned()
            .collect())
    }
}

/// Notifier that keeps events in memory and logs them.
#[derive(Default, Clone)]
pub struct InMemoryNotifier {
    events: Arc<Mutex<Vec<ModerationEvent>>>,
}

impl InMemoryNotifier {
    pub fn events(&self) -> Vec<ModerationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ModerationNotifier for InMemoryNotifier {
    fn publish(&self, event: ModerationEvent) -> Result<(), NotifyError> {
        info!(kind = ?event.kind, revision = %event.revision_id, author = %event.author, "moderation event");
        self.events
            .lock()
            .map_err(|_| NotifyError::Transport("event log lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
