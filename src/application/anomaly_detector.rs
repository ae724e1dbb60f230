// Anomaly detection over a health window
use crate::domain::health::{AnomalyCounts, HealthFlag, HealthStats};
use crate::domain::statistics::{drift, max, mean, min, std_dev, z_score};
use crate::domain::telemetry::TelemetrySample;
use crate::infrastructure::config::HealthThresholds;

const INITIAL_HEALTH: i32 = 100;

const TEMPERATURE_SPIKE_DEDUCTION: i32 = 30;
const THROUGHPUT_DROP_DEDUCTION: i32 = 30;
const PRESSURE_LOW_DEDUCTION: i32 = 10;
const ALIGNMENT_DRIFT_DEDUCTION: i32 = 40;
const ZSCORE_DEDUCTION: i32 = 10;

/// Raw outcome of the rule pass, before severity is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub health: u8,
    pub flags: Vec<HealthFlag>,
    pub counts: AnomalyCounts,
    pub stats: HealthStats,
}

/// Applies window-wide threshold rules and latest-sample z-score rules.
///
/// `window` must be non-empty; the engine only calls this once the minimum
/// sample guard has passed.
pub fn detect(
    latest: &TelemetrySample,
    window: &[TelemetrySample],
    thresholds: &HealthThresholds,
) -> Assessment {
    let temps: Vec<f64> = window.iter().map(|s| s.temperature).collect();
    let pressures: Vec<f64> = window.iter().map(|s| s.pressure).collect();
    let aligns: Vec<f64> = window.iter().map(|s| s.alignment_error).collect();
    let throughputs: Vec<f64> = window.iter().map(|s| s.throughput).collect();

    let temp_mean = mean(&temps);
    let temp_std = std_dev(&temps);
    let temp_z = z_score(latest.temperature, temp_mean, temp_std);

    let align_mean = mean(&aligns);
    let align_std = std_dev(&aligns);
    let align_z = z_score(latest.alignment_error, align_mean, align_std);

    let thr_mean = mean(&throughputs);
    let thr_std = std_dev(&throughputs);
    let thr_z = z_score(latest.throughput, thr_mean, thr_std);

    let stats = HealthStats {
        temp_mean,
        temp_std,
        temp_z,
        align_mean,
        align_std,
        align_z,
        thr_mean,
        thr_std,
        thr_z,
        drift: drift(&aligns),
        max_temp: max(&temps),
        min_throughput: min(&throughputs),
        min_pressure: min(&pressures),
    };

    let temp_zscore_hit = temp_z.abs() > thresholds.temperature_zscore;
    let throughput_zscore_hit = thr_z < -thresholds.throughput_zscore;
    let alignment_zscore_hit = align_z > thresholds.alignment_zscore;

    let counts = AnomalyCounts {
        temp_spike: temps.iter().filter(|&&t| t > thresholds.temperature_max).count(),
        throughput_drop: throughputs
            .iter()
            .filter(|&&t| t < thresholds.throughput_min)
            .count(),
        pressure_low: pressures.iter().filter(|&&p| p < thresholds.pressure_min).count(),
        drift: aligns
            .iter()
            .filter(|&&a| a > thresholds.alignment_error_max)
            .count(),
        zscore: [temp_zscore_hit, throughput_zscore_hit, alignment_zscore_hit]
            .into_iter()
            .filter(|hit| *hit)
            .count(),
    };

    let rules = [
        (
            stats.max_temp > thresholds.temperature_max,
            HealthFlag::TemperatureSpike,
            TEMPERATURE_SPIKE_DEDUCTION,
        ),
        (
            stats.min_throughput < thresholds.throughput_min,
            HealthFlag::ThroughputDrop,
            THROUGHPUT_DROP_DEDUCTION,
        ),
        (
            stats.min_pressure < thresholds.pressure_min,
            HealthFlag::PressureLow,
            PRESSURE_LOW_DEDUCTION,
        ),
        (
            stats.drift > thresholds.alignment_drift_max,
            HealthFlag::AlignmentDrift,
            ALIGNMENT_DRIFT_DEDUCTION,
        ),
        (temp_zscore_hit, HealthFlag::TempZscoreAnomaly, ZSCORE_DEDUCTION),
        (
            throughput_zscore_hit,
            HealthFlag::ThroughputZscoreAnomaly,
            ZSCORE_DEDUCTION,
        ),
        (
            alignment_zscore_hit,
            HealthFlag::AlignmentZscoreAnomaly,
            ZSCORE_DEDUCTION,
        ),
    ];

    let mut score = INITIAL_HEALTH;
    let mut flags = Vec::new();
    for (fired, flag, deduction) in rules {
        if fired {
            score -= deduction;
            flags.push(flag);
        }
    }

    Assessment {
        health: score.clamp(0, 100) as u8,
        flags,
        counts,
        stats,
    }
}
