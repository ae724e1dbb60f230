// Application layer - Use cases, repository contract, health engine
pub mod anomaly_detector;
pub mod dashboard_service;
pub mod error;
pub mod health_service;
pub mod machine_service;
pub mod retention_service;
pub mod severity;
pub mod telemetry_repository;
pub mod telemetry_service;
pub mod trend_recorder;
