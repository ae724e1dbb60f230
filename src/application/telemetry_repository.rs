// Repository trait for telemetry data access
use crate::domain::machine::Machine;
use crate::domain::telemetry::{FabOverview, LatestSample, TelemetryRecord, TelemetrySample};
use crate::infrastructure::config::HealthThresholds;
use async_trait::async_trait;

#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    /// Newest sample for a machine plus its current status
    async fn latest_sample(&self, machine_id: i64) -> anyhow::Result<Option<LatestSample>>;

    /// Samples newer than `now - minutes`, ascending by timestamp
    async fn window_samples(
        &self,
        machine_id: i64,
        minutes: u32,
    ) -> anyhow::Result<Vec<TelemetrySample>>;

    async fn list_machines(&self) -> anyhow::Result<Vec<Machine>>;

    async fn create_machine(&self, name: &str, status: &str) -> anyhow::Result<Machine>;

    async fn insert_telemetry(&self, sample: &TelemetrySample) -> anyhow::Result<TelemetryRecord>;

    /// Newest-first, at most `limit` rows
    async fn recent_telemetry(
        &self,
        machine_id: i64,
        limit: u32,
    ) -> anyhow::Result<Vec<TelemetryRecord>>;

    /// Averages across all machines over the trailing window
    async fn fab_overview(&self, minutes: u32) -> anyhow::Result<FabOverview>;

    /// Newest-first samples breaching any fixed threshold
    async fn active_alerts(
        &self,
        thresholds: &HealthThresholds,
        limit: u32,
    ) -> anyhow::Result<Vec<TelemetryRecord>>;

    /// Keep only the newest `max_rows_per_machine` rows per machine; returns rows deleted
    async fn prune_telemetry(&self, max_rows_per_machine: u32) -> anyhow::Result<u64>;
}

/// Whether a sample breaches any of the fixed thresholds.
pub fn breaches_threshold(sample: &TelemetrySample, thresholds: &HealthThresholds) -> bool {
    sample.temperature > thresholds.temperature_max
        || sample.alignment_error > thresholds.alignment_error_max
        || sample.throughput < thresholds.throughput_min
        || sample.pressure < thresholds.pressure_min
}
