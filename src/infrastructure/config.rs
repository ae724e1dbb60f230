use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Fixed-threshold and z-score cutoffs used by the anomaly detector.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HealthThresholds {
    pub temperature_max: f64,
    pub throughput_min: f64,
    pub pressure_min: f64,
    pub alignment_error_max: f64,
    pub alignment_drift_max: f64,
    pub temperature_zscore: f64,
    pub throughput_zscore: f64,
    pub alignment_zscore: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            temperature_max: 80.0,
            throughput_min: 80.0,
            pressure_min: 0.97,
            alignment_error_max: 0.02,
            alignment_drift_max: 0.01,
            temperature_zscore: 2.5,
            throughput_zscore: 1.5,
            alignment_zscore: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HealthSettings {
    pub window_minutes: u32,
    pub min_window_samples: usize,
    pub trend_capacity: usize,
    pub store_timeout_ms: u64,
    pub thresholds: HealthThresholds,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            window_minutes: 30,
            min_window_samples: 5,
            trend_capacity: 600,
            store_timeout_ms: 5000,
            thresholds: HealthThresholds::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RetentionSettings {
    pub enabled: bool,
    pub max_rows_per_machine: u32,
    pub interval_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rows_per_machine: 50_000,
            interval_secs: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DashboardSettings {
    pub default_timeline_minutes: u32,
    pub overview_minutes: u32,
    pub alert_limit: u32,
    pub recent_limit: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_timeline_minutes: 60,
            overview_minutes: 10,
            alert_limit: 50,
            recent_limit: 100,
        }
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("MACHINE_HEALTH")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
