use crate::cli::ServeArgs;
use crate::infra::{seed_demo_backend, AppState};
use crate::routes::with_case_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use casedesk::cases::api::{CaseApi, HttpCaseApi};
use casedesk::config::AppConfig;
use casedesk::error::AppError;
use casedesk::telemetry;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
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

    match config.api.base_url.as_deref() {
        Some(base_url) => {
            info!(%base_url, "serving case views from the upstream case API");
            let api = HttpCaseApi::from_config(&config.api)?;
            serve(config, Arc::new(api)).await
        }
        None => {
            info!("no upstream case API configured; serving the seeded in-memory backend");
            serve(config, Arc::new(seed_demo_backend(Utc::now()))).await
        }
    }
}

async fn serve<A>(config: AppConfig, api: Arc<A>) -> Result<(), AppError>
where
    A: CaseApi + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_case_routes(api, config.views.page_size)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, page_size = config.views.page_size, "case view service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
