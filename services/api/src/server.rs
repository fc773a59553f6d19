use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryIdentityDirectory, InMemorySubmissionStore};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civic_feedback::config::AppConfig;
use civic_feedback::error::AppError;
use civic_feedback::portal::{AuthEvent, FeedbackService, FeedbackServiceError, IdentityDirectory};
use civic_feedback::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
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

    let store = Arc::new(InMemorySubmissionStore::default());
    let directory = Arc::new(
        InMemoryIdentityDirectory::from_config(&config.portal)
            .map_err(FeedbackServiceError::from)?,
    );
    if directory.administrator_count() == 0 {
        warn!("no administrators configured; the triage dashboard will refuse every caller");
    }
    tokio::spawn(log_auth_events(directory.subscribe()));

    let service = Arc::new(FeedbackService::with_intake_limits(
        store,
        directory,
        config.portal.intake_limits,
    ));

    let app = with_portal_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "civic feedback portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_auth_events(mut events: broadcast::Receiver<AuthEvent>) {
    loop {
        match events.recv().await {
            Ok(AuthEvent::SignedIn(identity)) => {
                info!(user_id = %identity.user_id.as_str(), "session started")
            }
            Ok(AuthEvent::SignedOut(identity)) => {
                info!(user_id = %identity.user_id.as_str(), "session ended")
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "auth event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
