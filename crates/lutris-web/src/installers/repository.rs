use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{Installer, InstallerId};
use super::moderation::{HistoryEntry, InstallerRevision, RevisionId, RevisionStatus};
use crate::catalog::GameSlug;

/// Storage abstraction for installers so services can be exercised in isolation.
pub trait InstallerRepository: Send + Sync {
    fn next_id(&self) -> Result<InstallerId, RepositoryError>;
    fn insert(&self, installer: Installer) -> Result<Installer, RepositoryError>;
    fn update(&self, installer: Installer) -> Result<(), RepositoryError>;
    fn fetch(&self, id: InstallerId) -> Result<Option<Installer>, RepositoryError>;
    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Installer>, RepositoryError>;
    fn list(&self) -> Result<Vec<Installer>, RepositoryError>;
    fn for_game(&self, game: &GameSlug) -> Result<Vec<Installer>, RepositoryError>;
    fn slugs(&self) -> Result<HashSet<String>, RepositoryError>;
}

/// Storage for proposed installer changes.
pub trait RevisionRepository: Send + Sync {
    fn next_id(&self) -> Result<RevisionId, RepositoryError>;
    fn insert(&self, revision: InstallerRevision) -> Result<InstallerRevision, RepositoryError>;
    fn update(&self, revision: InstallerRevision) -> Result<(), RepositoryError>;
    fn fetch(&self, id: RevisionId) -> Result<Option<InstallerRevision>, RepositoryError>;
    fn delete(&self, id: RevisionId) -> Result<(), RepositoryError>;
    fn with_status(&self, status: RevisionStatus) -> Result<Vec<InstallerRevision>, RepositoryError>;
    fn by_author(&self, author: &str) -> Result<Vec<InstallerRevision>, RepositoryError>;
    fn for_installer(&self, id: InstallerId) -> Result<Vec<InstallerRevision>, RepositoryError>;
}

/// Append-only snapshots of installers taken before they are overwritten.
pub trait HistoryRepository: Send + Sync {
    fn record(&self, entry: HistoryEntry) -> Result<(), RepositoryError>;
    fn for_installer(&self, id: InstallerId) -> Result<Vec<HistoryEntry>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for moderation side effects (mail, chat webhooks, ...).
pub trait ModerationNotifier: Send + Sync {
    fn publish(&self, event: ModerationEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationEventKind {
    Submitted,
    Accepted,
    Rejected,
}

/// Plain payload handed to notifiers; rendering is up to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub kind: ModerationEventKind,
    pub revision_id: RevisionId,
    pub game_slug: GameSlug,
    pub installer_slug: Option<String>,
    pub author: String,
    pub moderator: Option<String>,
    pub reason: Option<String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
