// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::care_repository::CareDataAccess;
use crate::application::vitals_service::{DashboardOptions, DashboardTarget, VitalsDashboard};
use crate::domain::vitals::default_vitals;
use crate::infrastructure::care_api_client::CareApiClient;
use crate::infrastructure::config::load_config;
use crate::infrastructure::ws_transport::WsTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_vitals, health_check, stream_vitals, toggle_stats, update_target,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_config()?;
    let reconnect = config.reconnect.policy()?;

    // Create adapters (infrastructure layer)
    let care_data: Arc<dyn CareDataAccess> = Arc::new(CareApiClient::new(
        config.api.base_url.clone(),
        config.api.token.clone(),
    ));
    let transport = Arc::new(WsTransport::new());

    // Create the dashboard (application layer)
    let dashboard = Arc::new(VitalsDashboard::new(
        care_data.clone(),
        transport,
        default_vitals(),
        DashboardOptions {
            compact: config.dashboard.compact,
            reconnect,
        },
    ));

    let patient = match config.dashboard.patient_id.as_deref() {
        Some(patient_id) => match care_data.get_patient(patient_id).await {
            Ok(patient) => Some(patient),
            Err(e) => {
                tracing::warn!("Could not load patient {}: {}", patient_id, e);
                None
            }
        },
        None => None,
    };
    let endpoint = dashboard
        .retarget(DashboardTarget {
            facility_id: config.dashboard.facility_id.clone(),
            patient,
            endpoint_override: config.dashboard.socket_url.clone(),
        })
        .await;
    match &endpoint {
        Some(url) => tracing::info!("Streaming observations from {}", url),
        None => tracing::info!("No observation endpoint resolved, showing fallback vitals"),
    }

    let state = Arc::new(AppState {
        dashboard: dashboard.clone(),
        care_data,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/vitals", get(get_vitals))
        .route("/vitals/stream", get(stream_vitals))
        .route("/vitals/stats", post(toggle_stats))
        .route("/vitals/target", put(update_target))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting bedside-vitals service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    dashboard.shutdown().await;
    Ok(())
}
