// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::health_service::HealthService;
use crate::application::machine_service::MachineService;
use crate::application::telemetry_service::TelemetryService;

#[derive(Clone)]
pub struct AppState {
    pub machine_service: MachineService,
    pub telemetry_service: TelemetryService,
    pub dashboard_service: DashboardService,
    pub health_service: HealthService,
}
