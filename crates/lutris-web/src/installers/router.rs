use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::Installer;
use super::moderation::{
    Actor, DraftRequest, DraftSave, ModerationError, ModerationService, RevisionId,
    RevisionStatus,
};
use super::repository::{
    HistoryRepository, InstallerRepository, ModerationNotifier, RepositoryError,
    RevisionRepository,
};
use super::script::InstallerScript;
use crate::catalog::{GameSlug, Runner};

pub const USER_HEADER: &str = "x-lutris-user";
pub const MODERATOR_HEADER: &str = "x-lutris-moderator";

type SharedService<I, R, H, N> = Arc<ModerationService<I, R, H, N>>;

/// Router builder exposing installer lookup, validation and moderation endpoints.
pub fn installer_router<I, R, H, N>(service: SharedService<I, R, H, N>) -> Router
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    Router::new()
        .route("/api/installers", get(list_installers_handler::<I, R, H, N>))
        .route(
            "/api/installers/validate",
            post(validate_handler::<I, R, H, N>),
        )
        .route(
            "/api/installers/:slug",
            get(installer_handler::<I, R, H, N>),
        )
        .route(
            "/api/installers/:slug/revisions",
            get(installer_revisions_handler::<I, R, H, N>),
        )
        .route(
            "/api/installers/:slug/history",
            get(installer_history_handler::<I, R, H, N>),
        )
        .route(
            "/api/revisions",
            get(list_revisions_handler::<I, R, H, N>).post(save_draft_handler::<I, R, H, N>),
        )
        .route(
            "/api/revisions/:revision_id",
            get(revision_handler::<I, R, H, N>).delete(delete_handler::<I, R, H, N>),
        )
        .route(
            "/api/revisions/:revision_id/submit",
            post(submit_handler::<I, R, H, N>),
        )
        .route(
            "/api/revisions/:revision_id/accept",
            post(accept_handler::<I, R, H, N>),
        )
        .route(
            "/api/revisions/:revision_id/reject",
            post(reject_handler::<I, R, H, N>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct InstallerQuery {
    pub game: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateQuery {
    pub runner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevisionQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

pub(crate) async fn list_installers_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Query(query): Query<InstallerQuery>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let installers = match query.game {
        Some(game) => service.installers().for_game(&GameSlug(game)),
        None => service.installers().list(),
    };

    match installers {
        Ok(mut installers) => {
            installers.retain(|installer| installer.published);
            installers.sort_by(|a, b| a.slug.cmp(&b.slug));
            let documents: Vec<_> = installers.iter().map(Installer::as_document).collect();
            (StatusCode::OK, Json(documents)).into_response()
        }
        Err(err) => error_response(ModerationError::from(err)),
    }
}

pub(crate) async fn installer_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Path(slug): Path<String>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    match service.installers().fetch_by_slug(&slug) {
        Ok(Some(installer)) => (StatusCode::OK, Json(installer.as_document())).into_response(),
        Ok(None) => installer_not_found(&slug),
        Err(err) => error_response(ModerationError::from(err)),
    }
}

pub(crate) async fn validate_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Query(query): Query<ValidateQuery>,
    body: String,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let (script, declared_runner) = match InstallerScript::parse_document(&body) {
        Ok(parsed) => parsed,
        Err(err) => {
            let payload = json!({
                "valid": false,
                "errors": [err.to_string()],
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let runner = query
        .runner
        .or(declared_runner)
        .map(|runner| Runner::parse(&runner));
    let report = service.validator().validate_script(&script, runner.as_ref());
    let payload = json!({
        "valid": report.is_valid(),
        "errors": report.errors(),
        "issues": report.issues,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn installer_revisions_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Path(slug): Path<String>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let installer = match service.installers().fetch_by_slug(&slug) {
        Ok(Some(installer)) => installer,
        Ok(None) => return installer_not_found(&slug),
        Err(err) => return error_response(ModerationError::from(err)),
    };

    match service.revisions_for(installer.id) {
        Ok(revisions) => {
            let views: Vec<_> = revisions.iter().map(|revision| revision.summary_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn installer_history_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Path(slug): Path<String>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let installer = match service.installers().fetch_by_slug(&slug) {
        Ok(Some(installer)) => installer,
        Ok(None) => return installer_not_found(&slug),
        Err(err) => return error_response(ModerationError::from(err)),
    };

    match service.history_for(installer.id) {
        Ok(entries) => {
            let payload: Vec<_> = entries
                .iter()
                .map(|entry| {
                    json!({
                        "recorded_at": entry.recorded_at,
                        "author": entry.author,
                        "comment": entry.comment,
                        "installer": entry.snapshot.as_document(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_revisions_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Query(query): Query<RevisionQuery>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let status = match query.status.as_deref() {
        None => RevisionStatus::Submitted,
        Some(raw) => match RevisionStatus::parse(raw) {
            Some(status) => status,
            None => {
                let payload = json!({ "error": format!("unknown revision status: {raw}") });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        },
    };

    match service.with_status(status) {
        Ok(revisions) => {
            let views: Vec<_> = revisions.iter().map(|revision| revision.summary_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn revision_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    Path(revision_id): Path<u64>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    match service.revision(RevisionId(revision_id)) {
        Ok(revision) => (StatusCode::OK, Json(revision)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn save_draft_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    headers: HeaderMap,
    Json(request): Json<DraftRequest>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return missing_actor();
    };

    match service.store_draft(&actor, request) {
        Ok((revision, saved)) => {
            let status = match saved {
                DraftSave::Created => StatusCode::CREATED,
                DraftSave::Updated => StatusCode::OK,
            };
            (status, Json(revision)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    headers: HeaderMap,
    Path(revision_id): Path<u64>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return missing_actor();
    };

    match service.submit(&actor, RevisionId(revision_id)) {
        Ok(revision) => (StatusCode::ACCEPTED, Json(revision.summary_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn accept_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    headers: HeaderMap,
    Path(revision_id): Path<u64>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return missing_actor();
    };

    match service.accept(&actor, RevisionId(revision_id)) {
        Ok(installer) => (StatusCode::OK, Json(installer.as_document())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    headers: HeaderMap,
    Path(revision_id): Path<u64>,
    Json(request): Json<RejectRequest>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return missing_actor();
    };

    match service.reject(&actor, RevisionId(revision_id), &request.reason) {
        Ok(revision) => (StatusCode::OK, Json(revision.summary_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<I, R, H, N>(
    State(service): State<SharedService<I, R, H, N>>,
    headers: HeaderMap,
    Path(revision_id): Path<u64>,
) -> Response
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    let Some(actor) = actor_from_headers(&headers) else {
        return missing_actor();
    };

    match service.delete(&actor, RevisionId(revision_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// Acting user as resolved by the upstream auth layer.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let username = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    let moderator = headers
        .get(MODERATOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes"));

    Some(Actor {
        username: username.to_string(),
        moderator,
    })
}

/// HTTP status matching a moderation failure.
pub fn moderation_status(error: &ModerationError) -> StatusCode {
    match error {
        ModerationError::Script(_) | ModerationError::MissingReason => StatusCode::BAD_REQUEST,
        ModerationError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ModerationError::InvalidTransition { .. }
        | ModerationError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ModerationError::Forbidden(_) => StatusCode::FORBIDDEN,
        ModerationError::RevisionNotFound(_)
        | ModerationError::InstallerNotFound(_)
        | ModerationError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ModerationError::Repository(RepositoryError::Unavailable(_))
        | ModerationError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: ModerationError) -> Response {
    let status = moderation_status(&error);
    let payload = match &error {
        ModerationError::Invalid(report) => json!({
            "error": error.to_string(),
            "issues": report.issues,
        }),
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}

fn installer_not_found(slug: &str) -> Response {
    let payload = json!({ "error": format!("installer {slug} not found") });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn missing_actor() -> Response {
    let payload = json!({ "error": format!("missing {USER_HEADER} header") });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}
