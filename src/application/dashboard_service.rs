// Dashboard service - Read-side use cases behind the fab dashboard
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::{FabOverview, LatestSample, TelemetryRecord, TelemetrySample};
use crate::infrastructure::config::{DashboardSettings, HealthThresholds};
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn TelemetryRepository>,
    settings: DashboardSettings,
    thresholds: HealthThresholds,
}

impl DashboardService {
    pub fn new(
        repository: Arc<dyn TelemetryRepository>,
        settings: DashboardSettings,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            repository,
            settings,
            thresholds,
        }
    }

    pub async fn latest(&self, machine_id: i64) -> anyhow::Result<Option<LatestSample>> {
        self.repository.latest_sample(machine_id).await
    }

    /// Samples for charting; a missing or zero window falls back to the default.
    pub async fn timeline(
        &self,
        machine_id: i64,
        minutes: Option<u32>,
    ) -> anyhow::Result<Vec<TelemetrySample>> {
        let minutes = minutes
            .filter(|m| *m > 0)
            .unwrap_or(self.settings.default_timeline_minutes);
        self.repository.window_samples(machine_id, minutes).await
    }

    pub async fn overview(&self) -> anyhow::Result<FabOverview> {
        self.repository
            .fab_overview(self.settings.overview_minutes)
            .await
    }

    pub async fn alerts(&self) -> anyhow::Result<Vec<TelemetryRecord>> {
        self.repository
            .active_alerts(&self.thresholds, self.settings.alert_limit)
            .await
    }
}
