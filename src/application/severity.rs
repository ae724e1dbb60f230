// Hybrid severity: flag-driven and score-driven verdicts, worse one wins
use crate::domain::health::{HealthFlag, Severity};

const CRITICAL_FLAGS: [HealthFlag; 3] = [
    HealthFlag::ThroughputDrop,
    HealthFlag::TemperatureSpike,
    HealthFlag::PressureLow,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityVerdict {
    pub flag_driven: Severity,
    pub score_driven: Severity,
    pub combined: Severity,
}

pub fn flag_severity(flags: &[HealthFlag], zscore_count: usize) -> Severity {
    if flags.iter().any(|f| CRITICAL_FLAGS.contains(f)) {
        Severity::Critical
    } else if flags.contains(&HealthFlag::AlignmentDrift) || zscore_count >= 2 {
        Severity::Major
    } else if !flags.is_empty() {
        Severity::Minor
    } else {
        Severity::Healthy
    }
}

pub fn score_severity(health: u8) -> Severity {
    match health {
        0..40 => Severity::Critical,
        40..70 => Severity::Major,
        70..90 => Severity::Minor,
        _ => Severity::Healthy,
    }
}

pub fn reconcile(flags: &[HealthFlag], zscore_count: usize, health: u8) -> SeverityVerdict {
    let flag_driven = flag_severity(flags, zscore_count);
    let score_driven = score_severity(health);
    SeverityVerdict {
        flag_driven,
        score_driven,
        combined: flag_driven.max(score_driven),
    }
}
