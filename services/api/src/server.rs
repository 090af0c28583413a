use crate::cli::ServeArgs;
use crate::infra::{seed_installers, AppState};
use crate::routes::with_installer_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lutris_web::config::AppConfig;
use lutris_web::error::AppError;
use lutris_web::installers::{
    InMemoryHistoryRepository, InMemoryInstallerRepository, InMemoryNotifier,
    InMemoryRevisionRepository, ModerationService,
};
use lutris_web::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let installers = Arc::new(InMemoryInstallerRepository::default());
    if let Some(dir) = &config.installers.seed_dir {
        seed_installers(installers.as_ref(), dir)?;
    }

    let moderation_service = Arc::new(ModerationService::new(
        installers,
        Arc::new(InMemoryRevisionRepository::default()),
        Arc::new(InMemoryHistoryRepository::default()),
        Arc::new(InMemoryNotifier::default()),
        config.installers.validation(),
    ));

    let app = with_installer_routes(moderation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "installer service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
