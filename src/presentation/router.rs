// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    active_alerts, create_machine, fab_overview, health_check, ingest_telemetry, latest_telemetry,
    list_machines, machine_health, machine_trend, recent_telemetry, timeline,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/machines", get(list_machines).post(create_machine))
        .route("/telemetry", post(ingest_telemetry))
        .route("/telemetry/:machine_id", get(recent_telemetry))
        .route("/dashboard/machines/:id/latest", get(latest_telemetry))
        .route("/dashboard/machines/:id/timeline", get(timeline))
        .route("/dashboard/machines/:id/health", get(machine_health))
        .route("/dashboard/machines/:id/trend", get(machine_trend))
        .route("/dashboard/stats/overview", get(fab_overview))
        .route("/dashboard/alerts", get(active_alerts))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
