use super::common::*;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::catalog::Runner;
use crate::installers::memory::{
    InMemoryHistoryRepository, InMemoryInstallerRepository, InMemoryNotifier,
    InMemoryRevisionRepository,
};
use crate::installers::repository::InstallerRepository;
use crate::installers::router::{
    installer_router, validate_handler, ValidateQuery, MODERATOR_HEADER, USER_HEADER,
};

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

fn json_request(method: &str, uri: &str, user: Option<(&str, bool)>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some((username, moderator)) = user {
        builder = builder.header(USER_HEADER, username);
        if moderator {
            builder = builder.header(MODERATOR_HEADER, "true");
        }
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("request")
}

fn draft_payload(content: &str) -> Value {
    json!({
        "game": { "slug": "quake", "name": "Quake" },
        "version": "GOG",
        "runner": "linux",
        "description": "GOG release",
        "content": content,
    })
}

#[tokio::test]
async fn validate_handler_reports_rule_failures() {
    let harness = harness();
    let response = validate_handler::<
        InMemoryInstallerRepository,
        InMemoryRevisionRepository,
        InMemoryHistoryRepository,
        InMemoryNotifier,
    >(
        State(harness.service.clone()),
        Query(ValidateQuery {
            runner: Some("steam".to_string()),
        }),
        "game:\n  args: -windowed\n".to_string(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], json!(false));
    assert_eq!(payload["errors"], json!(["steam installers need game.appid"]));
    assert_eq!(payload["issues"][0]["rule"], json!("runner_requirements"));
}

#[tokio::test]
async fn validate_route_uses_the_document_runner_and_rejects_bad_yaml() {
    let router = installer_router(harness().service);

    let document = format!("runner: wine\nscript:\n{}", indent(WINE_SCRIPT));
    let response = send(
        &router,
        Request::post("/api/installers/validate")
            .body(Body::from(document))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["valid"], json!(true));

    let response = send(
        &router,
        Request::post("/api/installers/validate")
            .body(Body::from("game: [unterminated"))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], json!(false));
    assert_eq!(payload["errors"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn installer_lookup_returns_documents() {
    let harness = harness();
    let mut hidden = installer(2, Runner::Linux, "Humble", LINUX_SCRIPT);
    hidden.published = false;
    harness
        .installers
        .insert(installer(1, Runner::Wine, "GOG", WINE_SCRIPT))
        .expect("seed");
    harness.installers.insert(hidden).expect("seed");
    let slug = installer(1, Runner::Wine, "GOG", WINE_SCRIPT).slug;
    let router = installer_router(harness.service);

    let response = send(&router, Request::get("/api/installers/nope").body(Body::empty()).expect("request")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &router,
        Request::get(format!("/api/installers/{slug}"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["runner"], json!("wine"));
    assert_eq!(payload["script"]["game"]["arch"], json!("win64"));

    let response = send(
        &router,
        Request::get("/api/installers?game=the-elder-scrolls-iv")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn moderation_flow_over_http() {
    let harness = harness();
    let router = installer_router(harness.service.clone());

    let response = send(
        &router,
        json_request("POST", "/api/revisions", Some(("strider", false)), draft_payload(LINUX_SCRIPT)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let draft = read_json_body(response).await;
    assert_eq!(draft["status"], json!("draft"));
    let id = draft["id"].as_u64().expect("revision id");

    let response = send(
        &router,
        json_request("POST", &format!("/api/revisions/{id}/submit"), Some(("strider", false)), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(read_json_body(response).await["status"], json!("submitted"));

    let response = send(
        &router,
        Request::get("/api/revisions?status=submission")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let queue = read_json_body(response).await;
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let response = send(
        &router,
        json_request("POST", &format!("/api/revisions/{id}/accept"), Some(("strider", false)), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &router,
        json_request("POST", &format!("/api/revisions/{id}/accept"), Some(("gandalf", true)), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let published = read_json_body(response).await;
    assert_eq!(published["slug"], json!("quake-gog"));

    let response = send(
        &router,
        Request::get("/api/installers/quake-gog/revisions")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let revisions = read_json_body(response).await;
    assert_eq!(revisions[0]["status"], json!("accepted"));

    let response = send(
        &router,
        Request::delete(format!("/api/revisions/{id}"))
            .header(USER_HEADER, "strider")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_and_invalid_revisions_map_to_client_errors() {
    let harness = harness();
    let router = installer_router(harness.service.clone());

    let response = send(
        &router,
        json_request("POST", "/api/revisions", Some(("strider", false)), draft_payload("files:\n- bad-id: x\n")),
    )
    .await;
    let id = read_json_body(response).await["id"].as_u64().expect("revision id");

    let response = send(
        &router,
        json_request("POST", &format!("/api/revisions/{id}/submit"), Some(("strider", false)), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["issues"][0]["rule"], json!("files"));

    let response = send(
        &router,
        json_request("POST", &format!("/api/revisions/{id}/reject"), Some(("gandalf", true)), json!({ "reason": "no" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &router,
        json_request("DELETE", &format!("/api/revisions/{id}"), Some(("strider", false)), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &router,
        Request::get(format!("/api/revisions/{id}"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_require_a_user_and_statuses_must_be_known() {
    let router = installer_router(harness().service);

    let response = send(
        &router,
        json_request("POST", "/api/revisions", None, draft_payload(LINUX_SCRIPT)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &router,
        Request::get("/api/revisions?status=pending")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn indent(script: &str) -> String {
    script
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| format!("  {line}\n"))
        .collect()
}

#[tokio::test]
async fn saving_an_open_draft_again_updates_it() {
    let harness = harness();
    let router = installer_router(harness.service.clone());

    let response = send(
        &router,
        json_request("POST", "/api/revisions", Some(("strider", false)), draft_payload(LINUX_SCRIPT)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;

    let mut edit = draft_payload(LINUX_SCRIPT);
    edit["description"] = json!("GOG release, patched");
    let response = send(
        &router,
        json_request("POST", "/api/revisions", Some(("strider", false)), edit),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json_body(response).await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["description"], json!("GOG release, patched"));
}
