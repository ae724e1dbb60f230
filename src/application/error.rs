// Health engine failures
use thiserror::Error;

/// Faults surfaced by the health engine.
///
/// Missing or short windows are not errors; they come back as degenerate
/// reports.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("telemetry store unavailable: {0:#}")]
    StoreUnavailable(anyhow::Error),

    #[error("telemetry invariant violated: {0}")]
    InvariantViolation(String),
}

/// Rejections when accepting new telemetry.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid telemetry: {0}")]
    Invalid(String),

    #[error("failed to store telemetry: {0:#}")]
    Store(anyhow::Error),
}
