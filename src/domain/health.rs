// Health report domain models
use super::telemetry::LatestSample;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Ordinal severity; declaration order is the rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Healthy,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Healthy => "HEALTHY",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFlag {
    NoData,
    InsufficientData,
    TemperatureSpike,
    ThroughputDrop,
    PressureLow,
    AlignmentDrift,
    TempZscoreAnomaly,
    ThroughputZscoreAnomaly,
    AlignmentZscoreAnomaly,
}

impl HealthFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthFlag::NoData => "no_data",
            HealthFlag::InsufficientData => "insufficient_data",
            HealthFlag::TemperatureSpike => "temperature_spike",
            HealthFlag::ThroughputDrop => "throughput_drop",
            HealthFlag::PressureLow => "pressure_low",
            HealthFlag::AlignmentDrift => "alignment_drift",
            HealthFlag::TempZscoreAnomaly => "temp_zscore_anomaly",
            HealthFlag::ThroughputZscoreAnomaly => "throughput_zscore_anomaly",
            HealthFlag::AlignmentZscoreAnomaly => "alignment_zscore_anomaly",
        }
    }
}

impl std::fmt::Display for HealthFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category violation counts across the whole window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyCounts {
    pub temp_spike: usize,
    pub throughput_drop: usize,
    pub pressure_low: usize,
    pub drift: usize,
    /// Number of latest-sample z-score rules that fired (0..=3).
    pub zscore: usize,
}

/// Intermediate values behind a verdict, exposed for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthStats {
    pub temp_mean: f64,
    pub temp_std: f64,
    pub temp_z: f64,
    pub align_mean: f64,
    pub align_std: f64,
    pub align_z: f64,
    pub thr_mean: f64,
    pub thr_std: f64,
    pub thr_z: f64,
    pub drift: f64,
    pub max_temp: f64,
    pub min_throughput: f64,
    pub min_pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub health: u8,
}

impl TrendPoint {
    pub fn new(timestamp: DateTime<Utc>, health: u8) -> Self {
        Self { timestamp, health }
    }
}

/// Health verdict for one machine at one evaluation instant.
///
/// Degenerate reports (`no_data`, `insufficient_data`) carry no severity,
/// counts, stats or trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub health: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub flags: Vec<HealthFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_counts: Option<AnomalyCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<HealthStats>,
    pub latest: Option<LatestSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<TrendPoint>>,
}

impl HealthReport {
    pub fn no_data() -> Self {
        Self {
            health: 0,
            severity: None,
            flags: vec![HealthFlag::NoData],
            anomaly_counts: None,
            stats: None,
            latest: None,
            trend: None,
        }
    }

    pub fn insufficient_data(latest: LatestSample) -> Self {
        Self {
            health: 50,
            severity: None,
            flags: vec![HealthFlag::InsufficientData],
            anomaly_counts: None,
            stats: None,
            latest: Some(latest),
            trend: None,
        }
    }
}
