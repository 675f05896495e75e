//! the generation orchestrator — drives [`crate::pool::WorkerPool`]
//! once per requested wallet, streaming each result to a collaborator
//! and stopping early (with a partial summary) on cancellation.

use crate::pattern::Pattern;
use crate::pool::{CancelToken, WorkerPool};
use crate::stats::{AggregateMetrics, StatsAggregator, WorkerStats};
use crate::wallet::Wallet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Anything that can receive stats pushes and hand back a point-in-time
/// snapshot. [`StatsAggregator`] is the only implementation this repo
/// ships, but the orchestrator and pool depend only on the trait so a
/// collaborator (a TUI bridge, a metrics exporter) can stand in for it.
pub trait StatsSink {
    fn update_worker_stats(&self, stats: WorkerStats);
    fn snapshot(&self) -> AggregateMetrics;
    fn reset(&self);
}

impl StatsSink for StatsAggregator {
    fn update_worker_stats(&self, stats: WorkerStats) {
        StatsAggregator::update_worker_stats(self, stats)
    }

    fn snapshot(&self) -> AggregateMetrics {
        StatsAggregator::snapshot(self)
    }

    fn reset(&self) {
        StatsAggregator::reset(self)
    }
}

/// One wallet's worth of information published to a [`ResultSink`].
/// Carries the full [`Wallet`] (including its secret key) — the sink is
/// the collaborator responsible for whatever happens to it next
/// (persist it, encrypt it, or simply count it).
pub struct PublishedResult {
    pub index: usize,
    pub wallet: Wallet,
    pub attempts: u64,
    pub duration: Duration,
}

/// Called synchronously, in generation order, once per wallet found.
/// May be a file writer, a TUI bridge, or a no-op counter.
pub trait ResultSink {
    fn publish(&mut self, result: PublishedResult);
}

/// A sink that discards everything — useful for benchmarking and tests
/// that only care about the summary.
#[derive(Default)]
pub struct NullResultSink;

impl ResultSink for NullResultSink {
    fn publish(&mut self, _result: PublishedResult) {}
}

/// Metadata about one generated wallet, retained in [`Summary`] after
/// the wallet itself (and its secret key) has been handed off to the
/// result sink.
#[derive(Debug, Clone)]
pub struct WalletSummary {
    pub index: usize,
    pub address_hex: String,
    pub attempts: u64,
    pub duration: Duration,
}

/// Outcome of a [`generate_many`] call.
#[derive(Debug, Clone)]
pub struct Summary {
    pub successes: usize,
    pub total_attempts: u64,
    pub total_elapsed: Duration,
    pub per_wallet: Vec<WalletSummary>,
}

/// Search for one wallet matching `pattern`. `None` means the call was
/// cancelled (or hit the pool's safety timeout) before a match.
pub fn generate_one(
    pool: &WorkerPool,
    pattern: Arc<Pattern>,
    cancel: &CancelToken,
    stats_sink: &StatsAggregator,
) -> Option<Wallet> {
    pool.generate_one(pattern, cancel, stats_sink)
}

/// Point-in-time difficulty/probability/ETA readout — no search runs.
pub fn difficulty(pattern: &Pattern) -> crate::difficulty::DifficultySnapshot {
    crate::difficulty::DifficultySnapshot::compute(pattern)
}

/// Run the pool for `attempts_target` attempts without early-exit on a
/// match, returning aggregate speed/dispersion metrics.
pub fn benchmark(
    pool: &WorkerPool,
    pattern: Arc<Pattern>,
    attempts_target: u64,
    cancel: &CancelToken,
    stats_sink: &StatsAggregator,
) -> crate::pool::BenchmarkResult {
    pool.benchmark(pattern, attempts_target, cancel, stats_sink)
}

/// Drive the pool once per requested wallet. For `i` in `1..=count`:
/// invoke [`WorkerPool::generate_one`]; on a match, publish it to
/// `result_sink` and record its summary; on cancellation, stop and
/// return the partial summary gathered so far.
///
/// A fresh [`WorkerPool`] call is made per wallet rather than reusing
/// state across iterations — each `generate_one` call already tears
/// down and rebuilds its own channels/workers, so there is no pool
/// state to carry between wallets (a "clean re-initialization"
/// requirement is satisfied by construction, not by an explicit reset
/// step).
pub fn generate_many(
    pool: &WorkerPool,
    pattern: Arc<Pattern>,
    count: usize,
    cancel: &CancelToken,
    stats_sink: &StatsAggregator,
    result_sink: &mut dyn ResultSink,
) -> Summary {
    let run_start = Instant::now();
    let mut per_wallet = Vec::with_capacity(count);
    let mut total_attempts: u64 = 0;

    for i in 1..=count {
        let wallet_start = Instant::now();

        let wallet = match pool.generate_one(pattern.clone(), cancel, stats_sink) {
            Some(w) => w,
            None => break,
        };

        // `stats_sink` is reset at the start of every `generate_one` call,
        // so the post-run snapshot already holds only this wallet's total.
        let attempts_this_wallet = stats_sink.snapshot().total_attempts;
        let duration_this_wallet = wallet_start.elapsed();
        total_attempts += attempts_this_wallet;

        per_wallet.push(WalletSummary {
            index: i,
            address_hex: wallet.address_hex(),
            attempts: attempts_this_wallet,
            duration: duration_this_wallet,
        });

        result_sink.publish(PublishedResult {
            index: i,
            wallet,
            attempts: attempts_this_wallet,
            duration: duration_this_wallet,
        });
    }

    Summary {
        successes: per_wallet.len(),
        total_attempts,
        total_elapsed: run_start.elapsed(),
        per_wallet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_many_returns_exactly_count_wallets_without_cancellation() {
        let pattern = Arc::new(Pattern::new("", "", false).unwrap());
        let pool = WorkerPool::new(2);
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();
        let mut sink = NullResultSink;

        let summary = generate_many(&pool, pattern.clone(), 3, &cancel, &stats, &mut sink);

        assert_eq!(summary.successes, 3);
        assert_eq!(summary.per_wallet.len(), 3);
        assert_eq!(
            summary.per_wallet.iter().map(|w| w.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn generate_many_stops_early_and_reports_partial_summary_on_cancellation() {
        let pattern = Arc::new(Pattern::new("0".repeat(16), "".to_string(), false).unwrap());
        let pool = WorkerPool::with_timeouts(2, Duration::from_secs(24 * 3600), Duration::from_secs(2));
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();
        let mut sink = NullResultSink;

        let cancel_clone = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            cancel_clone.cancel();
        });

        let start = Instant::now();
        let summary = generate_many(&pool, pattern, 10, &cancel, &stats, &mut sink);

        assert!(summary.successes < 10);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn result_sink_receives_publications_in_order() {
        struct RecordingSink {
            seen: Vec<usize>,
        }
        impl ResultSink for RecordingSink {
            fn publish(&mut self, result: PublishedResult) {
                self.seen.push(result.index);
            }
        }

        let pattern = Arc::new(Pattern::new("", "", false).unwrap());
        let pool = WorkerPool::new(2);
        let cancel = CancelToken::new();
        let stats = StatsAggregator::new();
        let mut sink = RecordingSink { seen: Vec::new() };

        let summary = generate_many(&pool, pattern, 3, &cancel, &stats, &mut sink);

        assert_eq!(sink.seen, vec![1, 2, 3]);
        assert_eq!(summary.successes, 3);
    }
}
