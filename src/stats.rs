//! Thread-safe roll-up of per-worker attempts/speed into an
//! [`AggregateMetrics`] snapshot.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// A single worker's most recently published snapshot. Overwritten on
/// each push — there is one logical slot per worker id.
#[derive(Debug, Clone, Copy)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub cumulative_attempts: u64,
    pub instantaneous_speed: f64,
    pub last_update_instant: Instant,
}

/// Derived, copy-out view of the aggregator's internal map.
#[derive(Debug, Clone)]
pub struct AggregateMetrics {
    pub total_attempts: u64,
    pub total_speed: f64,
    pub avg_speed_since_start: f64,
    pub peak_speed: f64,
    pub per_worker_speed: HashMap<usize, f64>,
    pub per_worker_utilization: HashMap<usize, f64>,
    pub worker_count: usize,
    pub elapsed: Duration,
    pub thread_balance_score: f64,
    /// Lower-bound estimate of single-thread speed: `avg_speed_since_start / worker_count`.
    /// This is an approximation, not a calibrated baseline —
    /// it is *derived* from the multi-threaded run rather than measured by running
    /// one worker alone, so `efficiency_ratio` trends toward 1.0 by construction.
    pub est_single_thread_speed: f64,
    pub speedup_vs_single_thread: f64,
    pub efficiency_ratio: f64,
}

struct Inner {
    workers: HashMap<usize, WorkerStats>,
    peak_speed: f64,
    started_at: Instant,
}

/// Thread-safe `worker_id -> WorkerStats` map plus an O(1) aggregate
/// snapshot. Reads dominate writes (one push per worker per ~100ms
/// tick), so this is backed by an `RwLock` rather than a plain `Mutex`.
pub struct StatsAggregator {
    inner: RwLock<Inner>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                workers: HashMap::new(),
                peak_speed: 0.0,
                started_at: Instant::now(),
            }),
        }
    }

    /// Overwrite one worker's slot. Never blocks the caller for long:
    /// callers are expected to drop an update rather than wait if they
    /// can't acquire the lock promptly, per the lossy stats-channel
    /// policy — in practice the write lock here is held only
    /// for the duration of a hashmap insert.
    pub fn update_worker_stats(&self, stats: WorkerStats) {
        let mut inner = self.inner.write().unwrap();
        if stats.instantaneous_speed > inner.peak_speed {
            inner.peak_speed = stats.instantaneous_speed;
        }
        inner.workers.insert(stats.worker_id, stats);
    }

    /// Zero everything and reset the start timestamp. Called at the
    /// start of each orchestrator call.
    pub fn reset(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.workers.clear();
        inner.peak_speed = 0.0;
        inner.started_at = Instant::now();
    }

    /// Take an internally-consistent snapshot under a single read lock.
    pub fn snapshot(&self) -> AggregateMetrics {
        let inner = self.inner.read().unwrap();

        let total_attempts: u64 = inner.workers.values().map(|w| w.cumulative_attempts).sum();
        let total_speed: f64 = inner.workers.values().map(|w| w.instantaneous_speed).sum();
        let worker_count = inner.workers.len();
        let elapsed = inner.started_at.elapsed();

        let avg_speed_since_start = if elapsed.as_secs_f64() > 0.0 {
            total_attempts as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let per_worker_speed: HashMap<usize, f64> = inner
            .workers
            .iter()
            .map(|(id, w)| (*id, w.instantaneous_speed))
            .collect();

        let per_worker_utilization: HashMap<usize, f64> = if total_speed > 0.0 {
            per_worker_speed
                .iter()
                .map(|(id, speed)| (*id, speed / total_speed))
                .collect()
        } else {
            per_worker_speed.keys().map(|id| (*id, 0.0)).collect()
        };

        let est_single_thread_speed = if worker_count > 0 {
            avg_speed_since_start / worker_count as f64
        } else {
            0.0
        };

        let speedup_vs_single_thread = if est_single_thread_speed > 0.0 {
            total_speed / est_single_thread_speed
        } else {
            0.0
        };

        let efficiency_ratio = if est_single_thread_speed > 0.0 && worker_count > 0 {
            (total_speed / (est_single_thread_speed * worker_count as f64)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let thread_balance_score = if worker_count > 1 {
            let speeds: Vec<f64> = per_worker_speed.values().copied().collect();
            let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
            if mean > 0.0 {
                let variance =
                    speeds.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / speeds.len() as f64;
                let stddev = variance.sqrt();
                1.0 - (stddev / mean).min(1.0)
            } else {
                1.0
            }
        } else {
            1.0
        };

        AggregateMetrics {
            total_attempts,
            total_speed,
            avg_speed_since_start,
            peak_speed: inner.peak_speed,
            per_worker_speed,
            per_worker_utilization,
            worker_count,
            elapsed,
            thread_balance_score,
            est_single_thread_speed,
            speedup_vs_single_thread,
            efficiency_ratio,
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
