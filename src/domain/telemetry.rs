// Telemetry data domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One equipment reading. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub machine_id: i64,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub pressure: f64,
    pub alignment_error: f64,
    pub throughput: f64,
}

impl TelemetrySample {
    pub fn new(
        machine_id: i64,
        timestamp: DateTime<Utc>,
        temperature: f64,
        pressure: f64,
        alignment_error: f64,
        throughput: f64,
    ) -> Self {
        Self {
            machine_id,
            timestamp,
            temperature,
            pressure,
            alignment_error,
            throughput,
        }
    }

    /// Name of the first non-finite metric, if any.
    pub fn non_finite_metric(&self) -> Option<&'static str> {
        [
            ("temperature", self.temperature),
            ("pressure", self.pressure),
            ("alignment_error", self.alignment_error),
            ("throughput", self.throughput),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}

/// A persisted sample together with its store row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub id: i64,
    #[serde(flatten)]
    pub sample: TelemetrySample,
}

/// Most recent sample for a machine plus the machine's current status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSample {
    #[serde(flatten)]
    pub sample: TelemetrySample,
    pub status: String,
}

impl LatestSample {
    pub fn new(sample: TelemetrySample, status: String) -> Self {
        Self { sample, status }
    }
}

/// Fab-wide averages over a short trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FabOverview {
    pub avg_temperature: f64,
    pub avg_pressure: f64,
    pub avg_throughput: f64,
    pub rows_analyzed: i64,
}
