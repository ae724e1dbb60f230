// Telemetry service - Use cases for ingesting and reading raw samples
use crate::application::error::IngestError;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::telemetry::{TelemetryRecord, TelemetrySample};
use std::sync::Arc;

#[derive(Clone)]
pub struct TelemetryService {
    repository: Arc<dyn TelemetryRepository>,
    recent_limit: u32,
}

impl TelemetryService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, recent_limit: u32) -> Self {
        Self {
            repository,
            recent_limit,
        }
    }

    /// Validate and persist one sample.
    pub async fn record(&self, sample: TelemetrySample) -> Result<TelemetryRecord, IngestError> {
        if sample.machine_id <= 0 {
            return Err(IngestError::Invalid(format!(
                "machine id must be positive, got {}",
                sample.machine_id
            )));
        }
        if let Some(metric) = sample.non_finite_metric() {
            return Err(IngestError::Invalid(format!("{} must be a finite number", metric)));
        }

        let record = self
            .repository
            .insert_telemetry(&sample)
            .await
            .map_err(IngestError::Store)?;
        tracing::debug!("Stored telemetry {} for machine {}", record.id, sample.machine_id);
        Ok(record)
    }

    pub async fn recent(&self, machine_id: i64) -> anyhow::Result<Vec<TelemetryRecord>> {
        self.repository
            .recent_telemetry(machine_id, self.recent_limit)
            .await
    }
}
