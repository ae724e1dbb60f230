// Health engine - Scores a machine from its recent telemetry window
use crate::application::anomaly_detector::detect;
use crate::application::error::HealthError;
use crate::application::severity::reconcile;
use crate::application::telemetry_repository::TelemetryRepository;
use crate::application::trend_recorder::TrendRecorder;
use crate::domain::health::{HealthReport, TrendPoint};
use crate::domain::telemetry::{LatestSample, TelemetrySample};
use crate::infrastructure::config::HealthSettings;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct HealthService {
    repository: Arc<dyn TelemetryRepository>,
    settings: HealthSettings,
    trends: TrendRecorder,
}

impl HealthService {
    pub fn new(repository: Arc<dyn TelemetryRepository>, settings: HealthSettings) -> Self {
        Self {
            repository,
            settings,
            trends: TrendRecorder::new(settings.trend_capacity),
        }
    }

    /// Health history recorded by this engine for a machine, oldest first.
    pub fn trend(&self, machine_id: i64) -> Vec<TrendPoint> {
        self.trends.history(machine_id)
    }

    /// Score a machine's recent telemetry.
    ///
    /// Missing or short windows come back as degenerate reports; store
    /// failures and corrupt readings are errors and record no trend entry.
    pub async fn compute_health(&self, machine_id: i64) -> Result<HealthReport, HealthError> {
        let Some(latest) = self
            .read_store("latest sample", self.repository.latest_sample(machine_id))
            .await?
        else {
            tracing::debug!("No telemetry for machine {}", machine_id);
            return Ok(HealthReport::no_data());
        };

        let window = self
            .read_store(
                "window",
                self.repository
                    .window_samples(machine_id, self.settings.window_minutes),
            )
            .await?;

        if window.len() < self.settings.min_window_samples {
            tracing::debug!(
                "Machine {} has {} samples in the last {} minutes, need {}",
                machine_id,
                window.len(),
                self.settings.window_minutes,
                self.settings.min_window_samples
            );
            return Ok(HealthReport::insufficient_data(latest));
        }

        validate(machine_id, &latest, &window).inspect_err(|e| tracing::error!("{}", e))?;

        let assessment = detect(&latest.sample, &window, &self.settings.thresholds);
        let verdict = reconcile(&assessment.flags, assessment.counts.zscore, assessment.health);

        let trend = self
            .trends
            .record(machine_id, latest.sample.timestamp, assessment.health);

        let flag_names: Vec<String> = assessment.flags.iter().map(ToString::to_string).collect();
        tracing::debug!(
            "Machine {} health={} severity={} (flags: {}, score: {}) flags=[{}]",
            machine_id,
            assessment.health,
            verdict.combined.as_str(),
            verdict.flag_driven.as_str(),
            verdict.score_driven.as_str(),
            flag_names.join(", ")
        );

        Ok(HealthReport {
            health: assessment.health,
            severity: Some(verdict.combined),
            flags: assessment.flags,
            anomaly_counts: Some(assessment.counts),
            stats: Some(assessment.stats),
            latest: Some(latest),
            trend: Some(trend),
        })
    }

    async fn read_store<T>(
        &self,
        what: &str,
        read: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, HealthError> {
        let timeout = Duration::from_millis(self.settings.store_timeout_ms);
        match tokio::time::timeout(timeout, read).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!("Telemetry store read ({}) failed: {:#}", what, e);
                Err(HealthError::StoreUnavailable(e))
            }
            Err(_) => {
                tracing::warn!("Telemetry store read ({}) timed out after {:?}", what, timeout);
                Err(HealthError::StoreUnavailable(anyhow::anyhow!(
                    "{} read timed out after {:?}",
                    what,
                    timeout
                )))
            }
        }
    }
}

fn validate(
    machine_id: i64,
    latest: &LatestSample,
    window: &[TelemetrySample],
) -> Result<(), HealthError> {
    for sample in std::iter::once(&latest.sample).chain(window) {
        if sample.machine_id != machine_id {
            return Err(HealthError::InvariantViolation(format!(
                "sample at {} belongs to machine {}, expected {}",
                sample.timestamp, sample.machine_id, machine_id
            )));
        }
        if let Some(metric) = sample.non_finite_metric() {
            return Err(HealthError::InvariantViolation(format!(
                "non-finite {} for machine {} at {}",
                metric, machine_id, sample.timestamp
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::{HealthFlag, Severity};
    use crate::domain::machine::Machine;
    use crate::domain::telemetry::{FabOverview, TelemetryRecord};
    use crate::infrastructure::config::HealthThresholds;
    use crate::infrastructure::memory_repository::InMemoryRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Registers machines up to `machine_id`, then seeds `count` samples
    /// three seconds apart, ending now.
    async fn seed(
        repo: &InMemoryRepository,
        machine_id: i64,
        count: usize,
        f: impl Fn(usize) -> (f64, f64, f64, f64),
    ) {
        while (repo.list_machines().await.unwrap().len() as i64) < machine_id {
            repo.create_machine("Tool", "running").await.unwrap();
        }
        seed_unregistered(repo, machine_id, count, f).await;
    }

    async fn seed_unregistered(
        repo: &InMemoryRepository,
        machine_id: i64,
        count: usize,
        f: impl Fn(usize) -> (f64, f64, f64, f64),
    ) {
        let now = Utc::now();
        for i in 0..count {
            let (temperature, pressure, alignment_error, throughput) = f(i);
            let age = chrono::Duration::seconds(3 * (count - 1 - i) as i64);
            repo.insert_telemetry(&TelemetrySample::new(
                machine_id,
                now - age,
                temperature,
                pressure,
                alignment_error,
                throughput,
            ))
            .await
            .unwrap();
        }
    }

    fn service(repo: Arc<dyn TelemetryRepository>) -> HealthService {
        HealthService::new(repo, HealthSettings::default())
    }

    #[tokio::test]
    async fn test_no_data() {
        let svc = service(Arc::new(InMemoryRepository::new()));
        let report = svc.compute_health(1).await.unwrap();

        assert_eq!(report, HealthReport::no_data());
        assert_eq!(report.health, 0);
        assert!(report.latest.is_none());
        assert!(svc.trend(1).is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_machine_is_no_data() {
        let repo = Arc::new(InMemoryRepository::new());
        seed_unregistered(&repo, 99, 6, |_| (72.0, 1.0, 0.005, 150.0)).await;
        let svc = service(repo);

        let report = svc.compute_health(99).await.unwrap();
        assert_eq!(report, HealthReport::no_data());
        assert!(svc.trend(99).is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_data_ignores_values() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 4, |_| (120.0, 0.5, 0.5, 0.0)).await;
        let svc = service(repo);

        let report = svc.compute_health(1).await.unwrap();
        assert_eq!(report.health, 50);
        assert_eq!(report.flags, vec![HealthFlag::InsufficientData]);
        assert!(report.latest.is_some());
        assert!(report.severity.is_none());
        assert!(report.stats.is_none());
        assert!(svc.trend(1).is_empty());
    }

    #[tokio::test]
    async fn test_temperature_spike_is_critical() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.create_machine("Litho-1", "running").await.unwrap();
        seed(&repo, 1, 10, |i| {
            let temperature = if i == 9 { 85.0 } else { 70.0 };
            (temperature, 1.0, 0.005, 150.0)
        })
        .await;
        let svc = service(repo);

        let report = svc.compute_health(1).await.unwrap();
        assert!(report.flags.contains(&HealthFlag::TemperatureSpike));
        assert_eq!(report.severity, Some(Severity::Critical));
        assert_eq!(report.health, 60);
        assert_eq!(report.latest.as_ref().unwrap().status, "running");
        assert_eq!(report.stats.unwrap().max_temp, 85.0);
        assert_eq!(report.trend.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_alignment_drift_is_at_least_major() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 10, |i| {
            let alignment = if i == 9 { 0.02 } else { 0.005 };
            (72.0, 1.0, alignment, 150.0)
        })
        .await;
        let svc = service(repo);

        let report = svc.compute_health(1).await.unwrap();
        assert!(report.flags.contains(&HealthFlag::AlignmentDrift));
        assert!((report.stats.unwrap().drift - 0.015).abs() < 1e-12);
        assert!(report.severity.unwrap() >= Severity::Major);
    }

    #[tokio::test]
    async fn test_flat_nominal_window_is_healthy() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 12, |_| (72.0, 1.0, 0.005, 150.0)).await;
        let svc = service(repo);

        let report = svc.compute_health(1).await.unwrap();
        assert_eq!(report.health, 100);
        assert_eq!(report.severity, Some(Severity::Healthy));
        assert!(report.flags.is_empty());
        let stats = report.stats.unwrap();
        assert_eq!((stats.temp_z, stats.thr_z, stats.align_z), (0.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn test_trend_accumulates_per_engine() {
        let repo: Arc<InMemoryRepository> = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 6, |_| (72.0, 1.0, 0.005, 150.0)).await;
        let first = service(repo.clone());
        let second = service(repo);

        for _ in 0..3 {
            first.compute_health(1).await.unwrap();
        }
        let report = first.compute_health(1).await.unwrap();

        assert_eq!(report.trend.unwrap().len(), 4);
        assert!(second.trend(1).is_empty());
    }

    #[tokio::test]
    async fn test_trend_respects_capacity() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 5, |_| (72.0, 1.0, 0.005, 150.0)).await;
        let settings = HealthSettings {
            trend_capacity: 3,
            ..HealthSettings::default()
        };
        let svc = HealthService::new(repo, settings);

        for _ in 0..5 {
            svc.compute_health(1).await.unwrap();
        }
        assert_eq!(svc.trend(1).len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_same_machine() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 5, 8, |_| (72.0, 1.0, 0.005, 150.0)).await;
        let svc = service(repo);

        let tasks = (0..32).map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.compute_health(5).await })
        });
        let results = futures::future::join_all(tasks).await;
        for result in results {
            assert_eq!(result.unwrap().unwrap().health, 100);
        }

        assert_eq!(svc.trend(5).len(), 32);
    }

    #[tokio::test]
    async fn test_non_finite_reading_is_rejected() {
        let repo = Arc::new(InMemoryRepository::new());
        seed(&repo, 1, 6, |i| {
            let pressure = if i == 2 { f64::NAN } else { 1.0 };
            (72.0, pressure, 0.005, 150.0)
        })
        .await;
        let svc = service(repo);

        let err = svc.compute_health(1).await.unwrap_err();
        assert!(matches!(err, HealthError::InvariantViolation(_)));
        assert!(svc.trend(1).is_empty());
    }

    #[test]
    fn test_mixed_machine_window_is_rejected() {
        let now = Utc::now();
        let latest = LatestSample::new(
            TelemetrySample::new(1, now, 72.0, 1.0, 0.005, 150.0),
            "running".to_string(),
        );
        let mut window = vec![latest.sample.clone(); 5];
        window[3].machine_id = 2;

        let err = validate(1, &latest, &window).unwrap_err();
        assert!(err.to_string().contains("machine 2"));
        assert!(validate(1, &latest, &window[..3]).is_ok());
    }

    /// Fails or stalls the window read after serving a latest sample.
    struct FlakyRepository {
        inner: InMemoryRepository,
        stall: bool,
        window_calls: AtomicUsize,
    }

    #[async_trait]
    impl TelemetryRepository for FlakyRepository {
        async fn latest_sample(&self, machine_id: i64) -> anyhow::Result<Option<LatestSample>> {
            self.inner.latest_sample(machine_id).await
        }

        async fn window_samples(
            &self,
            _machine_id: i64,
            _minutes: u32,
        ) -> anyhow::Result<Vec<TelemetrySample>> {
            self.window_calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            anyhow::bail!("connection reset by peer")
        }

        async fn list_machines(&self) -> anyhow::Result<Vec<Machine>> {
            self.inner.list_machines().await
        }

        async fn create_machine(&self, name: &str, status: &str) -> anyhow::Result<Machine> {
            self.inner.create_machine(name, status).await
        }

        async fn insert_telemetry(
            &self,
            sample: &TelemetrySample,
        ) -> anyhow::Result<TelemetryRecord> {
            self.inner.insert_telemetry(sample).await
        }

        async fn recent_telemetry(
            &self,
            machine_id: i64,
            limit: u32,
        ) -> anyhow::Result<Vec<TelemetryRecord>> {
            self.inner.recent_telemetry(machine_id, limit).await
        }

        async fn fab_overview(&self, minutes: u32) -> anyhow::Result<FabOverview> {
            self.inner.fab_overview(minutes).await
        }

        async fn active_alerts(
            &self,
            thresholds: &HealthThresholds,
            limit: u32,
        ) -> anyhow::Result<Vec<TelemetryRecord>> {
            self.inner.active_alerts(thresholds, limit).await
        }

        async fn prune_telemetry(&self, max_rows_per_machine: u32) -> anyhow::Result<u64> {
            self.inner.prune_telemetry(max_rows_per_machine).await
        }
    }

    async fn flaky(stall: bool) -> Arc<FlakyRepository> {
        let inner = InMemoryRepository::new();
        seed(&inner, 1, 10, |_| (72.0, 1.0, 0.005, 150.0)).await;
        Arc::new(FlakyRepository {
            inner,
            stall,
            window_calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_store_failure_propagates_without_trend() {
        let repo = flaky(false).await;
        let svc = service(repo.clone());

        let err = svc.compute_health(1).await.unwrap_err();
        assert!(matches!(err, HealthError::StoreUnavailable(_)));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(repo.window_calls.load(Ordering::SeqCst), 1);
        assert!(svc.trend(1).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_timeout_is_unavailable() {
        let repo = flaky(true).await;
        let settings = HealthSettings {
            store_timeout_ms: 100,
            ..HealthSettings::default()
        };
        let svc = HealthService::new(repo, settings);

        let err = svc.compute_health(1).await.unwrap_err();
        assert!(matches!(err, HealthError::StoreUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
        assert!(svc.trend(1).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_evaluation_records_nothing() {
        let repo = flaky(true).await;
        let svc = service(repo.clone());

        let task = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.compute_health(1).await })
        };
        while repo.window_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(svc.trend(1).is_empty());
    }
}
