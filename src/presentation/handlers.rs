// HTTP request handlers
use crate::application::error::VitalsError;
use crate::application::vitals_service::DashboardTarget;
use crate::infrastructure::chunked_json::stream_views;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub facility_id: Option<String>,
    pub patient_id: Option<String>,
    pub socket_url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TargetResponse {
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatsResponse {
    pub show_stats: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard view
pub async fn get_vitals(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.dashboard.handle().view();
    match json_response(&view, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream a view per state change (newline-delimited JSON)
pub async fn stream_vitals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_views(state.dashboard.handle())
}

/// Toggle the waveform stats overlay
pub async fn toggle_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let show_stats = state.dashboard.handle().toggle_stats();
    Json(StatsResponse { show_stats })
}

/// Point the dashboard at a facility/patient and re-resolve the stream
pub async fn update_target(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TargetRequest>,
) -> Result<Json<TargetResponse>, (StatusCode, String)> {
    let patient = match request.patient_id.as_deref() {
        Some(patient_id) => match state.care_data.get_patient(patient_id).await {
            Ok(patient) => Some(patient),
            Err(e @ VitalsError::NotFound { .. }) => {
                return Err((StatusCode::NOT_FOUND, e.to_string()));
            }
            Err(e) => {
                tracing::error!("Error fetching patient {}: {}", patient_id, e);
                return Err((StatusCode::BAD_GATEWAY, e.to_string()));
            }
        },
        None => None,
    };

    let endpoint = state
        .dashboard
        .retarget(DashboardTarget {
            facility_id: request.facility_id,
            patient,
            endpoint_override: request.socket_url,
        })
        .await;
    Ok(Json(TargetResponse { endpoint }))
}
