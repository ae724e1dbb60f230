// Postgres repository implementation
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::machine::Machine;
use crate::domain::telemetry::{FabOverview, LatestSample, TelemetryRecord, TelemetrySample};
use crate::infrastructure::config::HealthThresholds;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const TELEMETRY_COLUMNS: &str =
    "id, machine_id, timestamp, temperature, pressure, alignment_error, throughput";

#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct TelemetryRow {
    id: i64,
    machine_id: i64,
    timestamp: DateTime<Utc>,
    temperature: f64,
    pressure: f64,
    alignment_error: f64,
    throughput: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct LatestRow {
    #[sqlx(flatten)]
    telemetry: TelemetryRow,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct MachineRow {
    id: i64,
    name: String,
    status: String,
}

#[derive(Debug, sqlx::FromRow)]
struct OverviewRow {
    total_rows: i64,
    avg_temp: Option<f64>,
    avg_pressure: Option<f64>,
    avg_throughput: Option<f64>,
}

impl From<TelemetryRow> for TelemetryRecord {
    fn from(row: TelemetryRow) -> Self {
        TelemetryRecord {
            id: row.id,
            sample: TelemetrySample::new(
                row.machine_id,
                row.timestamp,
                row.temperature,
                row.pressure,
                row.alignment_error,
                row.throughput,
            ),
        }
    }
}

impl From<MachineRow> for Machine {
    fn from(row: MachineRow) -> Self {
        Machine::new(row.id, row.name, row.status)
    }
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn minutes_param(minutes: u32) -> Result<i32> {
    i32::try_from(minutes).context("window size out of range")
}

#[async_trait]
impl TelemetryRepository for PostgresRepository {
    async fn latest_sample(&self, machine_id: i64) -> Result<Option<LatestSample>> {
        let row = sqlx::query_as::<_, LatestRow>(
            "SELECT t.id, t.machine_id, t.timestamp, t.temperature, t.pressure,
                    t.alignment_error, t.throughput,
                    m.status
             FROM telemetry t
             JOIN machines m ON m.id = t.machine_id
             WHERE t.machine_id = $1
             ORDER BY t.timestamp DESC, t.id DESC
             LIMIT 1",
        )
        .bind(machine_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest telemetry")?;

        Ok(row.map(|r| LatestSample::new(TelemetryRecord::from(r.telemetry).sample, r.status)))
    }

    async fn window_samples(&self, machine_id: i64, minutes: u32) -> Result<Vec<TelemetrySample>> {
        let query = format!(
            "SELECT {TELEMETRY_COLUMNS} FROM telemetry
             WHERE machine_id = $1
               AND timestamp > NOW() - make_interval(mins => $2)
             ORDER BY timestamp ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, TelemetryRow>(&query)
            .bind(machine_id)
            .bind(minutes_param(minutes)?)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch telemetry window")?;

        tracing::debug!("Fetched {} window samples for machine {}", rows.len(), machine_id);
        Ok(rows
            .into_iter()
            .map(|r| TelemetryRecord::from(r).sample)
            .collect())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>> {
        let rows = sqlx::query_as::<_, MachineRow>("SELECT id, name, status FROM machines ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list machines")?;

        Ok(rows.into_iter().map(Machine::from).collect())
    }

    async fn create_machine(&self, name: &str, status: &str) -> Result<Machine> {
        let row = sqlx::query_as::<_, MachineRow>(
            "INSERT INTO machines (name, status) VALUES ($1, $2) RETURNING id, name, status",
        )
        .bind(name)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create machine")?;

        Ok(row.into())
    }

    async fn insert_telemetry(&self, sample: &TelemetrySample) -> Result<TelemetryRecord> {
        let query = format!(
            "INSERT INTO telemetry (machine_id, timestamp, temperature, pressure, alignment_error, throughput)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TELEMETRY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TelemetryRow>(&query)
            .bind(sample.machine_id)
            .bind(sample.timestamp)
            .bind(sample.temperature)
            .bind(sample.pressure)
            .bind(sample.alignment_error)
            .bind(sample.throughput)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert telemetry")?;

        Ok(row.into())
    }

    async fn recent_telemetry(&self, machine_id: i64, limit: u32) -> Result<Vec<TelemetryRecord>> {
        let query = format!(
            "SELECT {TELEMETRY_COLUMNS} FROM telemetry
             WHERE machine_id = $1
             ORDER BY timestamp DESC, id DESC
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, TelemetryRow>(&query)
            .bind(machine_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch recent telemetry")?;

        Ok(rows.into_iter().map(TelemetryRecord::from).collect())
    }

    async fn fab_overview(&self, minutes: u32) -> Result<FabOverview> {
        let row = sqlx::query_as::<_, OverviewRow>(
            "SELECT COUNT(*) AS total_rows,
                    AVG(temperature) AS avg_temp,
                    AVG(pressure) AS avg_pressure,
                    AVG(throughput) AS avg_throughput
             FROM telemetry
             WHERE timestamp > NOW() - make_interval(mins => $1)",
        )
        .bind(minutes_param(minutes)?)
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch fab overview")?;

        Ok(FabOverview {
            avg_temperature: row.avg_temp.unwrap_or(0.0),
            avg_pressure: row.avg_pressure.unwrap_or(0.0),
            avg_throughput: row.avg_throughput.unwrap_or(0.0),
            rows_analyzed: row.total_rows,
        })
    }

    async fn active_alerts(
        &self,
        thresholds: &HealthThresholds,
        limit: u32,
    ) -> Result<Vec<TelemetryRecord>> {
        let query = format!(
            "SELECT {TELEMETRY_COLUMNS} FROM telemetry
             WHERE temperature > $1
                OR alignment_error > $2
                OR throughput < $3
                OR pressure < $4
             ORDER BY timestamp DESC, id DESC
             LIMIT $5"
        );
        let rows = sqlx::query_as::<_, TelemetryRow>(&query)
            .bind(thresholds.temperature_max)
            .bind(thresholds.alignment_error_max)
            .bind(thresholds.throughput_min)
            .bind(thresholds.pressure_min)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch active alerts")?;

        Ok(rows.into_iter().map(TelemetryRecord::from).collect())
    }

    async fn prune_telemetry(&self, max_rows_per_machine: u32) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM telemetry
             WHERE id IN (
                 SELECT id FROM (
                     SELECT id, ROW_NUMBER() OVER (
                         PARTITION BY machine_id ORDER BY timestamp DESC, id DESC
                     ) AS rn
                     FROM telemetry
                 ) ranked
                 WHERE ranked.rn > $1
             )",
        )
        .bind(i64::from(max_rows_per_machine))
        .execute(&self.pool)
        .await
        .context("Failed to prune telemetry")?;

        Ok(result.rows_affected())
    }
}
