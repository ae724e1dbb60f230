// Retention service - Periodic per-machine row cap on the telemetry store
use crate::application::telemetry_repository::TelemetryRepository;
use crate::infrastructure::config::RetentionSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct RetentionService {
    repository: Arc<dyn TelemetryRepository>,
    settings: RetentionSettings,
}

impl RetentionService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, settings: RetentionSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub async fn run_once(&self) -> anyhow::Result<u64> {
        let deleted = self
            .repository
            .prune_telemetry(self.settings.max_rows_per_machine)
            .await?;
        tracing::info!(
            "Telemetry cleanup complete: {} rows removed (cap {} per machine)",
            deleted,
            self.settings.max_rows_per_machine
        );
        Ok(deleted)
    }

    /// Spawn the cleanup loop. Failures are logged and the loop keeps going.
    pub fn spawn(self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.settings.interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!("Telemetry cleanup failed: {:#}", e);
                }
            }
        })
    }
}
