// HTTP request handlers
use crate::domain::health::{HealthReport, TrendPoint};
use crate::domain::machine::Machine;
use crate::domain::telemetry::{FabOverview, LatestSample, TelemetryRecord, TelemetrySample};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
pub struct TimelineQuery {
    pub minutes: Option<String>,
}

impl TimelineQuery {
    /// Unparseable values fall back to the configured default window
    fn minutes(&self) -> Option<u32> {
        self.minutes.as_deref().and_then(|m| m.trim().parse().ok())
    }
}

#[derive(Deserialize)]
pub struct NewMachine {
    pub name: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct NewTelemetry {
    #[serde(rename = "machineId", alias = "machine_id")]
    pub machine_id: i64,
    pub temperature: f64,
    pub pressure: f64,
    pub alignment_error: f64,
    pub throughput: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<NewTelemetry> for TelemetrySample {
    fn from(body: NewTelemetry) -> Self {
        TelemetrySample::new(
            body.machine_id,
            body.timestamp,
            body.temperature,
            body.pressure,
            body.alignment_error,
            body.throughput,
        )
    }
}

/// Liveness endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_machines(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Machine>> {
    state
        .machine_service
        .list_machines()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch machines", e))
}

pub async fn create_machine(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMachine>, JsonRejection>,
) -> ApiResult<Machine> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("machine name must not be empty".to_string()));
    }

    state
        .machine_service
        .create_machine(&body.name, &body.status)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to create machine", e))
}

pub async fn ingest_telemetry(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewTelemetry>, JsonRejection>,
) -> ApiResult<TelemetryRecord> {
    let Json(body) = payload.map_err(|e| {
        ApiError::BadRequest(format!("Missing or invalid telemetry fields: {}", e.body_text()))
    })?;

    let record = state.telemetry_service.record(body.into()).await?;
    Ok(Json(record))
}

pub async fn recent_telemetry(
    Path(machine_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<TelemetryRecord>> {
    state
        .telemetry_service
        .recent(machine_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch telemetry", e))
}

pub async fn latest_telemetry(
    Path(machine_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Option<LatestSample>> {
    state
        .dashboard_service
        .latest(machine_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch latest telemetry", e))
}

pub async fn timeline(
    Path(machine_id): Path<i64>,
    Query(query): Query<TimelineQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<TelemetrySample>> {
    state
        .dashboard_service
        .timeline(machine_id, query.minutes())
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch timeline data", e))
}

/// Health score, severity and flags for one machine
pub async fn machine_health(
    Path(machine_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<HealthReport> {
    let report = state.health_service.compute_health(machine_id).await?;
    Ok(Json(report))
}

pub async fn machine_trend(
    Path(machine_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<TrendPoint>> {
    Json(state.health_service.trend(machine_id))
}

pub async fn fab_overview(State(state): State<Arc<AppState>>) -> ApiResult<FabOverview> {
    state
        .dashboard_service
        .overview()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch fab overview", e))
}

pub async fn active_alerts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TelemetryRecord>> {
    state
        .dashboard_service
        .alerts()
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch alerts", e))
}
