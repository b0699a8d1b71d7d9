use crate::cli::ServeArgs;
use crate::infra::{in_memory_api, AppState};
use crate::routes::with_assignment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pr_reviewer::config::AppConfig;
use pr_reviewer::error::AppError;
use pr_reviewer::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

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

    let api = in_memory_api(config.assignment);
    let app = with_assignment_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        reassign_attempts = config.assignment.reassign_attempts,
        "reviewer assignment service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(drain_after(termination_signal(), readiness_flag))
        .await?;
    info!("reviewer assignment service stopped");
    Ok(())
}

/// Wait for `signal`, then flip readiness off so `/ready` reports 503 while
/// in-flight requests finish.
pub(crate) async fn drain_after<F>(signal: F, readiness: Arc<AtomicBool>)
where
    F: Future<Output = ()>,
{
    signal.await;
    readiness.store(false, Ordering::Release);
    info!("shutdown signal received, draining in-flight requests");
}

async fn termination_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
