use crate::cli::ServeArgs;
use crate::infra::{seeded_directory, AppState, Desk};
use crate::monitor;
use crate::routes::with_desk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use visitor_desk::config::AppConfig;
use visitor_desk::error::AppError;
use visitor_desk::telemetry;
use visitor_desk::workflows::RouteSettings;

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let settings = RouteSettings::from(&config.workflow);
    let desk = Desk::in_memory(seeded_directory(), settings);
    let overstay_monitor = monitor::spawn(
        Arc::clone(&desk.visits),
        config.workflow.poll_interval,
        settings.store_timeout,
    );

    let app = with_desk_routes(desk)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        poll_secs = config.workflow.poll_interval.as_secs(),
        "visitor desk ready"
    );

    let served = axum::serve(listener, app).await;
    overstay_monitor.abort();
    served?;
    Ok(())
}
