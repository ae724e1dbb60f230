// Per-machine bounded health history
use crate::domain::health::TrendPoint;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Buffer = Arc<Mutex<VecDeque<TrendPoint>>>;

/// Cloneable handle; clones share the same histories.
///
/// The map entry is only held to find or create a machine's buffer. Appends
/// and trims run under that buffer's own lock.
#[derive(Clone)]
pub struct TrendRecorder {
    buffers: Arc<DashMap<i64, Buffer>>,
    capacity: usize,
}

impl TrendRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Append a point and return a snapshot of the machine's buffer.
    ///
    /// A point older than the newest entry is inserted at its chronological
    /// position; the oldest entries are evicted past capacity.
    pub fn record(&self, machine_id: i64, timestamp: DateTime<Utc>, health: u8) -> Vec<TrendPoint> {
        let buffer = self.buffer_for(machine_id);
        let mut points = buffer.lock();

        let point = TrendPoint::new(timestamp, health);
        match points.back() {
            Some(last) if last.timestamp > timestamp => {
                let at = points.partition_point(|p| p.timestamp <= timestamp);
                points.insert(at, point);
            }
            _ => points.push_back(point),
        }

        while points.len() > self.capacity {
            points.pop_front();
        }

        points.iter().copied().collect()
    }

    pub fn history(&self, machine_id: i64) -> Vec<TrendPoint> {
        self.buffers
            .get(&machine_id)
            .map(|buffer| buffer.lock().iter().copied().collect())
            .unwrap_or_default()
    }

    fn buffer_for(&self, machine_id: i64) -> Buffer {
        self.buffers
            .entry(machine_id)
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;
    use std::thread;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    fn is_chronological(points: &[TrendPoint]) -> bool {
        points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }

    #[test]
    fn test_buffer_is_bounded_and_evicts_oldest() {
        let recorder = TrendRecorder::new(600);
        for i in 0..999 {
            recorder.record(1, t0() + Duration::seconds(i), (i % 101) as u8);
        }
        let last = recorder.record(1, t0() + Duration::seconds(999), 100);

        assert_eq!(last.len(), 600);
        assert_eq!(last[0].timestamp, t0() + Duration::seconds(400));
        assert_eq!(last[599].timestamp, t0() + Duration::seconds(999));
        assert!(is_chronological(&last));
        assert_eq!(recorder.history(1), last);
    }

    #[test]
    fn test_late_point_keeps_order() {
        let recorder = TrendRecorder::new(10);
        recorder.record(1, t0() + Duration::seconds(10), 90);
        recorder.record(1, t0() + Duration::seconds(30), 80);
        let points = recorder.record(1, t0() + Duration::seconds(20), 70);

        let healths: Vec<u8> = points.iter().map(|p| p.health).collect();
        assert_eq!(healths, vec![90, 70, 80]);
        assert!(is_chronological(&points));
    }

    #[test]
    fn test_machines_and_recorders_are_isolated() {
        let recorder = TrendRecorder::new(5);
        recorder.record(1, t0(), 100);
        recorder.record(2, t0(), 40);
        recorder.record(2, t0() + Duration::seconds(1), 45);

        assert_eq!(recorder.history(1).len(), 1);
        assert_eq!(recorder.history(2).len(), 2);
        assert!(recorder.history(3).is_empty());

        let other = TrendRecorder::new(5);
        assert!(other.history(1).is_empty());

        let shared = recorder.clone();
        shared.record(1, t0() + Duration::seconds(1), 99);
        assert_eq!(recorder.history(1).len(), 2);
    }

    #[test]
    fn test_concurrent_appends_same_machine() {
        let recorder = TrendRecorder::new(600);
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|tid| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    for j in 0..per_thread {
                        let offset = (tid * per_thread + j) as i64;
                        let points = recorder.record(42, t0() + Duration::seconds(offset), 80);
                        assert!(points.len() <= 600);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let points = recorder.history(42);
        assert_eq!(points.len(), threads * per_thread);
        assert!(is_chronological(&points));
        let unique: HashSet<_> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(unique.len(), points.len());
    }

    #[test]
    fn test_concurrent_appends_past_capacity() {
        let recorder = TrendRecorder::new(100);
        let handles: Vec<_> = (0..4)
            .map(|tid| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    for j in 0..100 {
                        recorder.record(7, t0() + Duration::seconds(tid * 1000 + j), 50);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let points = recorder.history(7);
        assert_eq!(points.len(), 100);
        assert!(is_chronological(&points));
    }
}
