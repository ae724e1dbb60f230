// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::health_service::HealthService;
use crate::application::machine_service::MachineService;
use crate::application::retention_service::RetentionService;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::application::telemetry_service::TelemetryService;
use crate::infrastructure::config::{load_app_config, StoreBackend, StoreSettings};
use crate::infrastructure::database::{create_pool, ensure_schema};
use crate::infrastructure::memory_repository::InMemoryRepository;
use crate::infrastructure::postgres_repository::PostgresRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

async fn build_repository(settings: &StoreSettings) -> anyhow::Result<Arc<dyn TelemetryRepository>> {
    match settings.backend {
        StoreBackend::Postgres => {
            let pool = create_pool(settings).await?;
            ensure_schema(&pool).await?;
            tracing::info!("Using Postgres telemetry store");
            Ok(Arc::new(PostgresRepository::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory telemetry store; data is lost on restart");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer)
    let repository = build_repository(&config.store).await?;

    // Create services (application layer)
    let machine_service = MachineService::new(repository.clone());
    let telemetry_service = TelemetryService::new(repository.clone(), config.dashboard.recent_limit);
    let dashboard_service =
        DashboardService::new(repository.clone(), config.dashboard, config.health.thresholds);
    let health_service = HealthService::new(repository.clone(), config.health);

    if config.retention.enabled {
        RetentionService::new(repository.clone(), config.retention).spawn();
    }

    // Create application state
    let state = Arc::new(AppState {
        machine_service,
        telemetry_service,
        dashboard_service,
        health_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting machine-health service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
