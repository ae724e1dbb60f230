// Machine service - Use case for listing and registering machines
use crate::application::telemetry_repository::TelemetryRepository;
use crate::domain::machine::Machine;
use std::sync::Arc;

#[derive(Clone)]
pub struct MachineService {
    repository: Arc<dyn TelemetryRepository>,
}

impl MachineService {
    pub fn new(repository: Arc<dyn TelemetryRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_machines(&self) -> anyhow::Result<Vec<Machine>> {
        self.repository.list_machines().await
    }

    pub async fn create_machine(&self, name: &str, status: &str) -> anyhow::Result<Machine> {
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "machine name must not be empty");

        let machine = self.repository.create_machine(name, status.trim()).await?;
        tracing::info!("Registered machine {} ({})", machine.id, machine.name);
        Ok(machine)
    }
}
