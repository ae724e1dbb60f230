// Domain layer - Pure types and arithmetic, no I/O
pub mod health;
pub mod machine;
pub mod statistics;
pub mod telemetry;
