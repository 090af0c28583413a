use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Game, GameSlug, Runner};
use crate::installers::domain::{Installer, InstallerId};

/// Identifier wrapper for installer revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevisionId(pub u64);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Moderation state of a revision: draft -> submitted -> accepted | rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    Draft,
    Submitted,
    Accepted,
    Rejected,
}

impl RevisionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RevisionStatus::Draft => "draft",
            RevisionStatus::Submitted => "submitted",
            RevisionStatus::Accepted => "accepted",
            RevisionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" | "submission" => Some(Self::Submitted),
            "accepted" | "published" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Revisions the author can still edit.
    pub fn is_open(&self) -> bool {
        matches!(self, RevisionStatus::Draft | RevisionStatus::Rejected)
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions that move a revision between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Edit,
    Submit,
    Accept,
    Reject,
    Delete,
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModerationAction::Edit => "edit",
            ModerationAction::Submit => "submit",
            ModerationAction::Accept => "accept",
            ModerationAction::Reject => "reject",
            ModerationAction::Delete => "delete",
        };
        f.write_str(label)
    }
}

impl ModerationAction {
    /// Target state for `action` taken from `from`, if the transition exists.
    pub fn transition(self, from: RevisionStatus) -> Option<RevisionStatus> {
        use RevisionStatus::*;
        match (self, from) {
            (ModerationAction::Edit, Draft | Rejected) => Some(Draft),
            (ModerationAction::Submit, Draft | Rejected) => Some(Submitted),
            (ModerationAction::Accept, Submitted) => Some(Accepted),
            (ModerationAction::Reject, Submitted) => Some(Rejected),
            (ModerationAction::Delete, Draft | Submitted | Rejected) => Some(from),
            _ => None,
        }
    }
}

/// Who performs an action. Identity is resolved upstream; this only carries the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    #[serde(default)]
    pub moderator: bool,
}

impl Actor {
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            moderator: false,
        }
    }

    pub fn moderator(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            moderator: true,
        }
    }
}

/// Author supplied content for a new or updated draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub installer_id: Option<InstallerId>,
    pub game: Game,
    pub version: String,
    pub runner: Runner,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub credits: String,
    pub content: String,
}

/// A proposed change to an installer (or a brand new installer when `installer_id` is empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallerRevision {
    pub id: RevisionId,
    pub installer_id: Option<InstallerId>,
    pub game_slug: GameSlug,
    pub game_name: String,
    pub author: String,
    pub version: String,
    pub runner: Runner,
    pub description: String,
    pub notes: String,
    pub credits: String,
    pub content: String,
    pub status: RevisionStatus,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InstallerRevision {
    pub(crate) fn apply_request(&mut self, request: DraftRequest) {
        self.installer_id = request.installer_id;
        self.game_slug = request.game.slug;
        self.game_name = request.game.name;
        self.version = request.version;
        self.runner = request.runner;
        self.description = request.description;
        self.notes = request.notes;
        self.credits = request.credits;
        self.content = request.content;
        self.updated_at = Utc::now();
    }

    /// Copy the revision's fields over an installer.
    pub(crate) fn apply_to(&self, installer: &mut Installer) {
        installer.game_slug = self.game_slug.clone();
        installer.game_name = self.game_name.clone();
        installer.version = self.version.clone();
        installer.runner = self.runner.clone();
        installer.description = self.description.clone();
        installer.notes = self.notes.clone();
        installer.credits = self.credits.clone();
        installer.content = self.content.clone();
        installer.published = true;
        installer.updated_at = Utc::now();
    }

    pub fn summary_view(&self) -> RevisionSummaryView {
        RevisionSummaryView {
            id: self.id,
            installer_id: self.installer_id,
            game_slug: self.game_slug.clone(),
            version: self.version.clone(),
            author: self.author.clone(),
            status: self.status.label(),
            review: self.review.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Compact listing representation of a revision.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionSummaryView {
    pub id: RevisionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_id: Option<InstallerId>,
    pub game_slug: GameSlug,
    pub version: String,
    pub author: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of an installer taken before a change overwrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub installer_id: InstallerId,
    pub recorded_at: DateTime<Utc>,
    pub author: String,
    pub comment: String,
    pub snapshot: Installer,
}

impl HistoryEntry {
    pub fn snapshot_of(installer: &Installer, author: &str, comment: impl Into<String>) -> Self {
        Self {
            installer_id: installer.id,
            recorded_at: Utc::now(),
            author: author.to_string(),
            comment: comment.into(),
            snapshot: installer.clone(),
        }
    }
}
