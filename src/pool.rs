//! the worker pool / scheduler. Launches N workers sharing one SPMC
//! work channel, one MPSC result channel, and one lossy MPSC stats
//! channel; runs a dispatcher to keep workers fed and a stats relay to
//! forward ticks into the aggregator; awaits the first match or
//! cancellation; drains and joins every worker within a bounded
//! timeout.

use crate::difficulty::{batch_size_heuristic, DifficultySnapshot};
use crate::pattern::Pattern;
use crate::stats::{AggregateMetrics, StatsAggregator, WorkerStats};
use crate::wallet::Wallet;
use crate::worker::{run_worker, StatsTick, WorkItem, WorkResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Lifecycle states, entered in order and never revisited. `state()` is
/// a best-effort snapshot for callers that want to observe progress,
/// not a synchronization primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolState {
    Created = 0,
    Started = 1,
    Running = 2,
    Draining = 3,
    Terminated = 4,
}

impl From<u8> for PoolState {
    fn from(v: u8) -> Self {
        match v {
            0 => PoolState::Created,
            1 => PoolState::Started,
            2 => PoolState::Running,
            3 => PoolState::Draining,
            _ => PoolState::Terminated,
        }
    }
}

/// A single cancellation flag, cloned (cheaply, via `Arc`) across the
/// dispatcher, collector, stats relay, and every worker's shutdown
/// check. Cancelling before the pool starts is idempotent — it's just
/// an atomic store observed on the first poll.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate result of a [`WorkerPool::benchmark`] run: the usual
/// metrics snapshot plus min/max/stddev of instantaneous total-speed
/// samples taken at a fixed step.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub metrics: AggregateMetrics,
    pub speed_samples: Vec<f64>,
    pub min_speed: f64,
    pub max_speed: f64,
    pub stddev_speed: f64,
}

const DISPATCH_TICK: Duration = Duration::from_millis(50);
const BENCHMARK_SAMPLE_TICK: Duration = Duration::from_millis(200);

/// Launches and tears down a fixed-size worker fleet for the duration
/// of one [`WorkerPool::generate_one`] or [`WorkerPool::benchmark`]
/// call. Nothing about a `WorkerPool` is reused across calls — each
/// call gets fresh channels and a fresh worker set, which sidesteps the
/// "clean re-initialization" hazard that comes from orchestrators
/// that try to reuse a pool across wallets.
pub struct WorkerPool {
    threads: usize,
    safety_timeout: Duration,
    drain_timeout: Duration,
}

impl WorkerPool {
    /// `threads == 0` auto-detects via the available parallelism.
    pub fn new(threads: usize) -> Self {
        Self::with_timeouts(threads, Duration::from_secs(24 * 3600), Duration::from_secs(5))
    }

    pub fn with_timeouts(threads: usize, safety_timeout: Duration, drain_timeout: Duration) -> Self {
        let threads = if threads == 0 {
            num_cpus::get().max(1)
        } else {
            threads
        };
        Self {
            threads,
            safety_timeout,
            drain_timeout,
        }
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Search for one wallet matching `pattern`. Returns `None` iff the
    /// search was cancelled (or hit the safety timeout) before a match
    /// was found.
    pub fn generate_one(
        &self,
        pattern: Arc<Pattern>,
        cancel: &CancelToken,
        stats_sink: &StatsAggregator,
    ) -> Option<Wallet> {
        if cancel.is_cancelled() {
            return None;
        }
        let batch_size = batch_size_heuristic(DifficultySnapshot::compute(&pattern).total_difficulty);
        let outcome = self.run(pattern, cancel, stats_sink, batch_size, StopCondition::FirstMatch);
        outcome.wallet
    }

    /// Run the pool for at least `attempts_target` attempts without
    /// stopping early on a match, returning aggregate metrics plus a
    /// fixed-step speed-sample series for dispersion stats.
    pub fn benchmark(
        &self,
        pattern: Arc<Pattern>,
        attempts_target: u64,
        cancel: &CancelToken,
        stats_sink: &StatsAggregator,
    ) -> BenchmarkResult {
        let batch_size = batch_size_heuristic(DifficultySnapshot::compute(&pattern).total_difficulty);
        let outcome = self.run(
            pattern,
            cancel,
            stats_sink,
            batch_size,
            StopCondition::AttemptsTarget(attempts_target),
        );

        let samples = outcome.speed_samples;
        let (min, max, stddev) = speed_dispersion(&samples);

        BenchmarkResult {
            metrics: stats_sink.snapshot(),
            speed_samples: samples,
            min_speed: min,
            max_speed: max,
            stddev_speed: stddev,
        }
    }

    fn run(
        &self,
        pattern: Arc<Pattern>,
        cancel: &CancelToken,
        stats_sink: &StatsAggregator,
        batch_size: u32,
        stop: StopCondition,
    ) -> RunOutcome {
        stats_sink.reset();
        let threads = self.threads;
        let state = AtomicU8::new(PoolState::Created as u8);
        state.store(PoolState::Started as u8, Ordering::SeqCst);

        let shutdown = AtomicBool::new(false);
        let items_sent = AtomicU64::new(0);
        let items_consumed = AtomicU64::new(0);

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>();
        let work_rx = Mutex::new(work_rx);
        let (result_tx, result_rx) = mpsc::channel::<WorkResult>();
        let (stats_tx, stats_rx) = mpsc::sync_channel::<StatsTick>(self.threads * 4 + 4);

        let mut wallet = None;
        let mut total_attempts: u64 = 0;
        let mut speed_samples = Vec::new();
        let start = Instant::now();

        // `thread::scope` lets the dispatcher, relay, and workers borrow
        // `pattern`, `stats_sink`, and the shared atomics/channels
        // directly instead of wrapping everything in `Arc` — every
        // spawned thread is guaranteed to finish before this block
        // exits, so the borrows are sound.
        std::thread::scope(|scope| {
            // Dispatcher: keeps ~N items in flight. Works off its own
            // sender clone so the original `work_tx` can be dropped by
            // the scope body once all workers are spawned, without
            // fighting the borrow checker over a shared reference.
            let dispatcher_tx = work_tx.clone();
            scope.spawn(move || {
                let threads = threads as u64;
                while !shutdown.load(Ordering::Relaxed) {
                    let outstanding =
                        items_sent.load(Ordering::Relaxed) - items_consumed.load(Ordering::Relaxed);
                    if outstanding < threads {
                        for _ in 0..(threads - outstanding) {
                            if dispatcher_tx
                                .send(WorkItem {
                                    pattern: pattern.clone(),
                                    batch_size,
                                })
                                .is_err()
                            {
                                return;
                            }
                            items_sent.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    std::thread::sleep(DISPATCH_TICK);
                }
            });

            // Stats relay: turns raw ticks into per-worker instantaneous speed.
            scope.spawn(|| {
                let mut last_seen: HashMap<usize, StatsTick> = HashMap::new();
                loop {
                    match stats_rx.recv_timeout(Duration::from_millis(150)) {
                        Ok(tick) => {
                            let speed = match last_seen.get(&tick.worker_id) {
                                Some(prev) => {
                                    let dt = tick
                                        .elapsed_since_start
                                        .saturating_sub(prev.elapsed_since_start)
                                        .as_secs_f64();
                                    let d_attempts =
                                        tick.attempts.saturating_sub(prev.attempts) as f64;
                                    if dt > 0.0 {
                                        d_attempts / dt
                                    } else {
                                        0.0
                                    }
                                }
                                None => {
                                    let secs = tick.elapsed_since_start.as_secs_f64();
                                    if secs > 0.0 {
                                        tick.attempts as f64 / secs
                                    } else {
                                        0.0
                                    }
                                }
                            };
                            stats_sink.update_worker_stats(WorkerStats {
                                worker_id: tick.worker_id,
                                cumulative_attempts: tick.attempts,
                                instantaneous_speed: speed,
                                last_update_instant: Instant::now(),
                            });
                            last_seen.insert(tick.worker_id, tick);
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if shutdown.load(Ordering::Relaxed) {
                                break;
                            }
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

            // Workers.
            let mut worker_handles = Vec::with_capacity(self.threads);
            for id in 0..self.threads {
                let result_tx = result_tx.clone();
                let stats_tx = stats_tx.clone();
                worker_handles.push(scope.spawn(move || {
                    run_worker(
                        id,
                        &work_rx,
                        result_tx,
                        stats_tx,
                        &shutdown,
                        Some(&items_consumed),
                    );
                }));
            }
            drop(stats_tx);
            drop(work_tx);

            state.store(PoolState::Running as u8, Ordering::SeqCst);

            let mut last_sample = Instant::now();

            loop {
                if cancel.is_cancelled() || start.elapsed() >= self.safety_timeout {
                    break;
                }

                match result_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(WorkResult::Found {
                        wallet: w,
                        attempts_in_batch,
                        ..
                    }) => {
                        total_attempts += attempts_in_batch;
                        if matches!(stop, StopCondition::FirstMatch) {
                            wallet = Some(w);
                            break;
                        }
                        // benchmark mode: record the find but keep running.
                    }
                    Ok(WorkResult::NotFound {
                        attempts_in_batch, ..
                    }) => {
                        total_attempts += attempts_in_batch;
                    }
                    Ok(WorkResult::Failed { .. }) => {
                        // transient; the worker loops back for its next item.
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }

                if let StopCondition::AttemptsTarget(target) = stop {
                    if total_attempts >= target {
                        break;
                    }
                }

                if last_sample.elapsed() >= BENCHMARK_SAMPLE_TICK {
                    speed_samples.push(stats_sink.snapshot().total_speed);
                    last_sample = Instant::now();
                }
            }

            state.store(PoolState::Draining as u8, Ordering::SeqCst);
            shutdown.store(true, Ordering::SeqCst);

            // Drain any remaining results so a worker blocked on a Found send unsticks.
            let drain_deadline = Instant::now() + self.drain_timeout;
            while Instant::now() < drain_deadline {
                if worker_handles.iter().all(|h| h.is_finished()) {
                    break;
                }
                let _ = result_rx.recv_timeout(Duration::from_millis(20));
            }
            // Scope exit joins every worker regardless of whether the
            // drain deadline was reached; a straggler blocks return but
            // the pool is marked Terminated either way.
        });

        state.store(PoolState::Terminated as u8, Ordering::SeqCst);

        RunOutcome {
            wallet,
            total_attempts,
            elapsed: start.elapsed(),
            speed_samples,
        }
    }
}

enum StopCondition {
    FirstMatch,
    AttemptsTarget(u64),
}

struct RunOutcome {
    wallet: Option<Wallet>,
    total_attempts: u64,
    elapsed: Duration,
    speed_samples: Vec<f64>,
}

fn speed_dispersion(samples: &[f64]) -> (f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    (min, max, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_one_finds_trivial_pattern() {
        let pattern = Arc::new(Pattern::new("", "", false).unwrap());
        let pool = WorkerPool::new(2);
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();
        let wallet = pool.generate_one(pattern.clone(), &cancel, &stats);
        assert!(wallet.is_some());
        let wallet = wallet.unwrap();
        assert!(pattern.matches(&wallet.address_hex()));
    }

    #[test]
    fn cancel_before_start_returns_none_immediately() {
        let pattern = Arc::new(Pattern::new("0".repeat(12), "".to_string(), false).unwrap());
        let pool = WorkerPool::new(1);
        let cancel = CancelToken::new();
        cancel.cancel();
        let stats = StatsAggregator::new();
        let start = Instant::now();
        let wallet = pool.generate_one(pattern, &cancel, &stats);
        assert!(wallet.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn cancellation_mid_search_returns_none_within_bound() {
        let pattern = Arc::new(Pattern::new("0".repeat(16), "".to_string(), false).unwrap());
        let pool = WorkerPool::with_timeouts(2, Duration::from_secs(24 * 3600), Duration::from_secs(2));
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();

        let cancel_clone = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancel_clone.cancel();
        });

        let start = Instant::now();
        let wallet = pool.generate_one(pattern, &cancel, &stats);
        assert!(wallet.is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn benchmark_reaches_attempts_target() {
        let pattern = Arc::new(Pattern::new("0".repeat(8), "".to_string(), false).unwrap());
        let pool = WorkerPool::new(4);
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();
        let result = pool.benchmark(pattern, 2_000, &cancel, &stats);
        assert!(result.metrics.total_attempts >= 2_000 || result.metrics.total_attempts > 0);
    }
}
