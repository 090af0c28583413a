use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use lutris_web::installers::{
    installer_router, HistoryRepository, InstallerRepository, ModerationNotifier,
    ModerationService, RevisionRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_installer_routes<I, R, H, N>(
    service: Arc<ModerationService<I, R, H, N>>,
) -> axum::Router
where
    I: InstallerRepository + 'static,
    R: RevisionRepository + 'static,
    H: HistoryRepository + 'static,
    N: ModerationNotifier + 'static,
{
    installer_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use lutris_web::installers::{
        InMemoryHistoryRepository, InMemoryInstallerRepository, InMemoryNotifier,
        InMemoryRevisionRepository, ValidationConfig,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> axum::Router {
        let service = Arc::new(ModerationService::new(
            Arc::new(InMemoryInstallerRepository::default()),
            Arc::new(InMemoryRevisionRepository::default()),
            Arc::new(InMemoryHistoryRepository::default()),
            Arc::new(InMemoryNotifier::default()),
            ValidationConfig::default(),
        ));
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_installer_routes(service).layer(Extension(state))
    }

    async fn get(router: &axum::Router, uri: &str) -> StatusCode {
        router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        let router = app(readiness.clone());

        assert_eq!(get(&router, "/health").await, StatusCode::OK);
        assert_eq!(get(&router, "/ready").await, StatusCode::SERVICE_UNAVAILABLE);
        readiness.store(true, Ordering::Release);
        assert_eq!(get(&router, "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn installer_routes_and_metrics_are_mounted() {
        let router = app(Arc::new(AtomicBool::new(true)));

        assert_eq!(get(&router, "/metrics").await, StatusCode::OK);
        assert_eq!(get(&router, "/api/installers").await, StatusCode::OK);
        assert_eq!(get(&router, "/api/installers/quake-gog").await, StatusCode::NOT_FOUND);
    }
}
