// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod database;
pub mod memory_repository;
pub mod postgres_repository;
