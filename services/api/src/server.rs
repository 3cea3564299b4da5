use crate::cli::ServeArgs;
use crate::infra::{seed_demo_marketplace, seeds_demo_marketplace, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hirechain::config::AppConfig;
use hirechain::error::AppError;
use hirechain::telemetry;
use hirechain::workflows::applications::{ApplicationService, InMemoryApplicationStore};
use hirechain::workflows::ledger::{InMemoryLedger, LedgerGateway};
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = LedgerGateway::new(InMemoryLedger::new());
    if seeds_demo_marketplace(config.environment) {
        if let Err(err) = seed_demo_marketplace(&gateway) {
            warn!(error = %err, "demo marketplace could not be seeded");
        }
    }
    let store = Arc::new(InMemoryApplicationStore::new());
    let application_service = Arc::new(ApplicationService::new(
        store,
        Arc::new(gateway),
        config.proof.clone(),
    ));
    let imported = application_service.sync_from_ledger()?;
    info!(imported, "application store synchronised with ledger");

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "hirechain application service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
