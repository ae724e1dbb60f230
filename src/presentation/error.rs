// HTTP error mapping
use crate::application::error::{HealthError, IngestError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log an infrastructure failure and hide its details behind `message`.
    pub fn internal(message: &str, err: anyhow::Error) -> Self {
        tracing::error!("{}: {:#}", message, err);
        ApiError::Internal(message.to_string())
    }
}

impl From<HealthError> for ApiError {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::StoreUnavailable(_) => ApiError::Unavailable(err.to_string()),
            HealthError::InvariantViolation(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Invalid(_) => ApiError::BadRequest(err.to_string()),
            IngestError::Store(e) => ApiError::internal("Failed to insert telemetry", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
