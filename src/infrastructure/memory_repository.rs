// In-process repository implementation (demo deployments and tests)
use crate::application::telemetry_repository::{breaches_threshold, TelemetryRepository};
use crate::domain::machine::Machine;
use crate::domain::statistics::mean;
use crate::domain::telemetry::{FabOverview, LatestSample, TelemetryRecord, TelemetrySample};
use crate::infrastructure::config::HealthThresholds;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct MemoryState {
    machines: Vec<Machine>,
    telemetry: Vec<TelemetryRecord>,
    next_machine_id: i64,
    next_telemetry_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn telemetry_count(&self) -> usize {
        self.state.read().telemetry.len()
    }
}

fn newest_first(records: &mut [TelemetryRecord]) {
    records.sort_by(|a, b| {
        b.sample
            .timestamp
            .cmp(&a.sample.timestamp)
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
impl TelemetryRepository for InMemoryRepository {
    async fn latest_sample(&self, machine_id: i64) -> Result<Option<LatestSample>> {
        let state = self.state.read();
        // Telemetry for an unregistered machine has no latest sample
        let Some(machine) = state.machines.iter().find(|m| m.id == machine_id) else {
            return Ok(None);
        };
        let latest = state
            .telemetry
            .iter()
            .filter(|r| r.sample.machine_id == machine_id)
            .max_by(|a, b| {
                a.sample
                    .timestamp
                    .cmp(&b.sample.timestamp)
                    .then(a.id.cmp(&b.id))
            });

        Ok(latest.map(|record| LatestSample::new(record.sample.clone(), machine.status.clone())))
    }

    async fn window_samples(&self, machine_id: i64, minutes: u32) -> Result<Vec<TelemetrySample>> {
        let since = Utc::now() - Duration::minutes(i64::from(minutes));
        let state = self.state.read();
        let mut window: Vec<&TelemetryRecord> = state
            .telemetry
            .iter()
            .filter(|r| r.sample.machine_id == machine_id && r.sample.timestamp > since)
            .collect();
        window.sort_by(|a, b| {
            a.sample
                .timestamp
                .cmp(&b.sample.timestamp)
                .then(a.id.cmp(&b.id))
        });

        Ok(window.into_iter().map(|r| r.sample.clone()).collect())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>> {
        let mut machines = self.state.read().machines.clone();
        machines.sort_by_key(|m| m.id);
        Ok(machines)
    }

    async fn create_machine(&self, name: &str, status: &str) -> Result<Machine> {
        let mut state = self.state.write();
        state.next_machine_id += 1;
        let machine = Machine::new(state.next_machine_id, name.to_string(), status.to_string());
        state.machines.push(machine.clone());
        Ok(machine)
    }

    async fn insert_telemetry(&self, sample: &TelemetrySample) -> Result<TelemetryRecord> {
        let mut state = self.state.write();
        state.next_telemetry_id += 1;
        let record = TelemetryRecord {
            id: state.next_telemetry_id,
            sample: sample.clone(),
        };
        state.telemetry.push(record.clone());
        Ok(record)
    }

    async fn recent_telemetry(&self, machine_id: i64, limit: u32) -> Result<Vec<TelemetryRecord>> {
        let mut records: Vec<TelemetryRecord> = self
            .state
            .read()
            .telemetry
            .iter()
            .filter(|r| r.sample.machine_id == machine_id)
            .cloned()
            .collect();
        newest_first(&mut records);
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn fab_overview(&self, minutes: u32) -> Result<FabOverview> {
        let since = Utc::now() - Duration::minutes(i64::from(minutes));
        let state = self.state.read();
        let rows: Vec<&TelemetrySample> = state
            .telemetry
            .iter()
            .map(|r| &r.sample)
            .filter(|s| s.timestamp > since)
            .collect();

        if rows.is_empty() {
            return Ok(FabOverview::default());
        }

        let column =
            |f: fn(&TelemetrySample) -> f64| -> Vec<f64> { rows.iter().map(|s| f(s)).collect() };
        Ok(FabOverview {
            avg_temperature: mean(&column(|s| s.temperature)),
            avg_pressure: mean(&column(|s| s.pressure)),
            avg_throughput: mean(&column(|s| s.throughput)),
            rows_analyzed: rows.len() as i64,
        })
    }

    async fn active_alerts(
        &self,
        thresholds: &HealthThresholds,
        limit: u32,
    ) -> Result<Vec<TelemetryRecord>> {
        let mut records: Vec<TelemetryRecord> = self
            .state
            .read()
            .telemetry
            .iter()
            .filter(|r| breaches_threshold(&r.sample, thresholds))
            .cloned()
            .collect();
        newest_first(&mut records);
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn prune_telemetry(&self, max_rows_per_machine: u32) -> Result<u64> {
        let mut state = self.state.write();
        let mut records = std::mem::take(&mut state.telemetry);
        newest_first(&mut records);

        let mut kept_per_machine: HashMap<i64, u32> = HashMap::new();
        let before = records.len();
        records.retain(|r| {
            let kept = kept_per_machine.entry(r.sample.machine_id).or_insert(0);
            *kept += 1;
            *kept <= max_rows_per_machine
        });
        let deleted = (before - records.len()) as u64;

        records.sort_by_key(|r| r.id);
        state.telemetry = records;
        Ok(deleted)
    }
}
