use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::revision::{
    Actor, DraftRequest, HistoryEntry, InstallerRevision, ModerationAction, RevisionId,
    RevisionStatus,
};
use crate::catalog::unique_slug;
use crate::installers::domain::{installer_slug, Installer, InstallerId};
use crate::installers::repository::{
    HistoryRepository, InstallerRepository, ModerationEvent, ModerationEventKind,
    ModerationNotifier, NotifyError, RepositoryError, RevisionRepository,
};
use crate::installers::script::{InstallerScript, ScriptError};
use crate::installers::validation::{InstallerValidator, ValidationConfig, ValidationReport};

/// Service composing the validator, the installer/revision/history stores and the notifier.
pub struct ModerationService<I, R, H, N> {
    installers: Arc<I>,
    revisions: Arc<R>,
    history: Arc<H>,
    notifier: Arc<N>,
    validator: Arc<InstallerValidator>,
}

impl<I, R, H, N> ModerationService<I, R, H, N>
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    pub fn new(
        installers: Arc<I>,
        revisions: Arc<R>,
        history: Arc<H>,
        notifier: Arc<N>,
        config: ValidationConfig,
    ) -> Self {
        Self {
            installers,
            revisions,
            history,
            notifier,
            validator: Arc::new(InstallerValidator::new(config)),
        }
    }

    pub fn validator(&self) -> &InstallerValidator {
        &self.validator
    }

    pub fn installers(&self) -> &I {
        &self.installers
    }

    /// Create a draft, or update the author's open revision for the same installer.
    pub fn save_draft(
        &self,
        actor: &Actor,
        request: DraftRequest,
    ) -> Result<InstallerRevision, ModerationError> {
        self.store_draft(actor, request).map(|(revision, _)| revision)
    }

    /// Like [`Self::save_draft`], also telling whether the draft is new.
    pub fn store_draft(
        &self,
        actor: &Actor,
        request: DraftRequest,
    ) -> Result<(InstallerRevision, DraftSave), ModerationError> {
        InstallerScript::parse(&request.content)?;

        if let Some(installer_id) = request.installer_id {
            self.installers
                .fetch(installer_id)?
                .ok_or(ModerationError::InstallerNotFound(installer_id))?;
        }

        let existing = self
            .revisions
            .by_author(&actor.username)?
            .into_iter()
            .find(|revision| {
                revision.status.is_open()
                    && revision.installer_id == request.installer_id
                    && (request.installer_id.is_some()
                        || (revision.game_slug == request.game.slug
                            && revision.version == request.version))
            });

        if let Some(mut revision) = existing {
            let next = transition(&revision, ModerationAction::Edit)?;
            revision.apply_request(request);
            revision.status = next;
            revision.review = None;
            self.revisions.update(revision.clone())?;
            debug!(revision = %revision.id, author = %actor.username, "draft updated");
            return Ok((revision, DraftSave::Updated));
        }

        let now = Utc::now();
        let revision = InstallerRevision {
            id: self.revisions.next_id()?,
            installer_id: request.installer_id,
            game_slug: request.game.slug,
            game_name: request.game.name,
            author: actor.username.clone(),
            version: request.version,
            runner: request.runner,
            description: request.description,
            notes: request.notes,
            credits: request.credits,
            content: request.content,
            status: RevisionStatus::Draft,
            review: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.revisions.insert(revision)?;
        debug!(revision = %stored.id, author = %actor.username, "draft created");
        Ok((stored, DraftSave::Created))
    }

    /// Send a draft to the moderation queue. Only valid scripts can be submitted.
    pub fn submit(
        &self,
        actor: &Actor,
        id: RevisionId,
    ) -> Result<InstallerRevision, ModerationError> {
        let mut revision = self.fetch_revision(id)?;
        if revision.author != actor.username {
            return Err(ModerationError::Forbidden(ModerationAction::Submit));
        }
        let next = transition(&revision, ModerationAction::Submit)?;
        self.ensure_valid(&revision)?;

        revision.status = next;
        revision.updated_at = Utc::now();
        self.revisions.update(revision.clone())?;

        info!(revision = %revision.id, game = %revision.game_slug, "installer submitted for review");
        self.notify(&revision, ModerationEventKind::Submitted, None, None)?;
        Ok(revision)
    }

    /// Publish a submission, snapshotting the installer it replaces.
    pub fn accept(
        &self,
        moderator: &Actor,
        id: RevisionId,
    ) -> Result<Installer, ModerationError> {
        if !moderator.moderator {
            return Err(ModerationError::Forbidden(ModerationAction::Accept));
        }
        let mut revision = self.fetch_revision(id)?;
        let next = transition(&revision, ModerationAction::Accept)?;
        self.ensure_valid(&revision)?;

        let installer = match revision.installer_id {
            Some(installer_id) => {
                let mut installer = self
                    .installers
                    .fetch(installer_id)?
                    .ok_or(ModerationError::InstallerNotFound(installer_id))?;
                self.history.record(HistoryEntry::snapshot_of(
                    &installer,
                    &revision.author,
                    format!("revision {} accepted by {}", revision.id, moderator.username),
                ))?;
                revision.apply_to(&mut installer);
                self.installers.update(installer.clone())?;
                installer
            }
            None => self.create_installer(&revision)?,
        };

        revision.installer_id = Some(installer.id);
        revision.status = next;
        revision.review = None;
        revision.updated_at = Utc::now();
        self.revisions.update(revision.clone())?;

        info!(
            revision = %revision.id,
            installer = %installer.slug,
            moderator = %moderator.username,
            "installer revision accepted"
        );
        self.notify(
            &revision,
            ModerationEventKind::Accepted,
            Some(moderator),
            None,
        )?;
        Ok(installer)
    }

    /// Send a submission back to its author with a review message.
    pub fn reject(
        &self,
        moderator: &Actor,
        id: RevisionId,
        reason: &str,
    ) -> Result<InstallerRevision, ModerationError> {
        if !moderator.moderator {
            return Err(ModerationError::Forbidden(ModerationAction::Reject));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ModerationError::MissingReason);
        }
        let mut revision = self.fetch_revision(id)?;
        let next = transition(&revision, ModerationAction::Reject)?;

        revision.status = next;
        revision.review = Some(reason.to_string());
        revision.updated_at = Utc::now();
        self.revisions.update(revision.clone())?;

        info!(revision = %revision.id, moderator = %moderator.username, "installer revision rejected");
        self.notify(
            &revision,
            ModerationEventKind::Rejected,
            Some(moderator),
            Some(reason.to_string()),
        )?;
        Ok(revision)
    }

    /// Authors delete their own open revisions; moderators any revision not yet accepted.
    pub fn delete(&self, actor: &Actor, id: RevisionId) -> Result<(), ModerationError> {
        let revision = self.fetch_revision(id)?;
        if revision.author != actor.username && !actor.moderator {
            return Err(ModerationError::Forbidden(ModerationAction::Delete));
        }
        transition(&revision, ModerationAction::Delete)?;
        self.revisions.delete(id)?;
        debug!(revision = %id, actor = %actor.username, "revision deleted");
        Ok(())
    }

    pub fn revision(&self, id: RevisionId) -> Result<InstallerRevision, ModerationError> {
        self.fetch_revision(id)
    }

    /// Moderation queue, oldest submission first.
    pub fn submissions(&self) -> Result<Vec<InstallerRevision>, ModerationError> {
        self.with_status(RevisionStatus::Submitted)
    }

    pub fn with_status(
        &self,
        status: RevisionStatus,
    ) -> Result<Vec<InstallerRevision>, ModerationError> {
        let mut revisions = self.revisions.with_status(status)?;
        revisions.sort_by_key(|revision| (revision.updated_at, revision.id));
        Ok(revisions)
    }

    pub fn revisions_for(
        &self,
        installer_id: InstallerId,
    ) -> Result<Vec<InstallerRevision>, ModerationError> {
        let mut revisions = self.revisions.for_installer(installer_id)?;
        revisions.sort_by_key(|revision| revision.id);
        Ok(revisions)
    }

    /// Previous versions of an installer, most recent first.
    pub fn history_for(
        &self,
        installer_id: InstallerId,
    ) -> Result<Vec<HistoryEntry>, ModerationError> {
        let mut entries = self.history.for_installer(installer_id)?;
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(entries)
    }

    fn fetch_revision(&self, id: RevisionId) -> Result<InstallerRevision, ModerationError> {
        self.revisions
            .fetch(id)?
            .ok_or(ModerationError::RevisionNotFound(id))
    }

    fn ensure_valid(&self, revision: &InstallerRevision) -> Result<(), ModerationError> {
        let script = InstallerScript::parse(&revision.content)?;
        let report = self.validator.validate_script(&script, Some(&revision.runner));
        if report.is_valid() {
            Ok(())
        } else {
            Err(ModerationError::Invalid(report))
        }
    }

    fn create_installer(&self, revision: &InstallerRevision) -> Result<Installer, ModerationError> {
        let taken = self.installers.slugs()?;
        let slug = unique_slug(
            &installer_slug(&revision.game_name, &revision.version),
            &taken,
        );
        let now = Utc::now();

        let installer = Installer {
            id: self.installers.next_id()?,
            game_slug: revision.game_slug.clone(),
            game_name: revision.game_name.clone(),
            slug,
            version: revision.version.clone(),
            runner: revision.runner.clone(),
            description: revision.description.clone(),
            notes: revision.notes.clone(),
            credits: revision.credits.clone(),
            content: revision.content.clone(),
            published: true,
            user: revision.author.clone(),
            created_at: now,
            updated_at: now,
        };

        Ok(self.installers.insert(installer)?)
    }

    fn notify(
        &self,
        revision: &InstallerRevision,
        kind: ModerationEventKind,
        moderator: Option<&Actor>,
        reason: Option<String>,
    ) -> Result<(), ModerationError> {
        let installer_slug = match revision.installer_id {
            Some(id) => self.installers.fetch(id)?.map(|installer| installer.slug),
            None => None,
        };

        self.notifier.publish(ModerationEvent {
            kind,
            revision_id: revision.id,
            game_slug: revision.game_slug.clone(),
            installer_slug,
            author: revision.author.clone(),
            moderator: moderator.map(|actor| actor.username.clone()),
            reason,
        })?;
        Ok(())
    }
}

fn transition(
    revision: &InstallerRevision,
    action: ModerationAction,
) -> Result<RevisionStatus, ModerationError> {
    action
        .transition(revision.status)
        .ok_or(ModerationError::InvalidTransition {
            from: revision.status,
            action,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSave {
    Created,
    Updated,
}

/// Error raised by the moderation service.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("installer failed validation: {}", .0.summary())]
    Invalid(ValidationReport),
    #[error("cannot {action} a {from} revision")]
    InvalidTransition {
        from: RevisionStatus,
        action: ModerationAction,
    },
    #[error("not allowed to {0} this revision")]
    Forbidden(ModerationAction),
    #[error("a rejection needs a reason")]
    MissingReason,
    #[error("revision {0} not found")]
    RevisionNotFound(RevisionId),
    #[error("installer {0} not found")]
    InstallerNotFound(InstallerId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}
