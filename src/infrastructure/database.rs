// Postgres pool and schema bootstrap
use crate::infrastructure::config::StoreSettings;
use anyhow::Context;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS machines (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS telemetry (
        id BIGSERIAL PRIMARY KEY,
        machine_id BIGINT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        temperature DOUBLE PRECISION NOT NULL,
        pressure DOUBLE PRECISION NOT NULL,
        alignment_error DOUBLE PRECISION NOT NULL,
        throughput DOUBLE PRECISION NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS telemetry_machine_time_idx
        ON telemetry (machine_id, timestamp)",
];

pub async fn create_pool(settings: &StoreSettings) -> anyhow::Result<PgPool> {
    let url = settings
        .database_url
        .as_deref()
        .context("store.database_url is required for the postgres backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(url)
        .await
        .context("Failed to connect to Postgres")?;

    Ok(pool)
}

pub async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply telemetry schema")?;
    }
    tracing::info!("Telemetry schema ready");
    Ok(())
}
