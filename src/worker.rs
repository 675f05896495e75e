//! the tight per-worker loop — sample key, derive address, match
//! pattern, emit result + stats. One worker exists for the duration of
//! a single orchestrator call; the pool owns its lifetime.

use crate::crypto::CryptoScratch;
use crate::pattern::Pattern;
use crate::wallet::Wallet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A unit of work handed to exactly one worker: the pattern to search
/// for and how many attempts to make before reporting back.
#[derive(Clone)]
pub struct WorkItem {
    pub pattern: Arc<Pattern>,
    pub batch_size: u32,
}

/// Outcome of running one `WorkItem` to completion (or abort).
pub enum WorkResult {
    Found {
        wallet: Wallet,
        attempts_in_batch: u64,
        worker_id: usize,
    },
    NotFound {
        attempts_in_batch: u64,
        worker_id: usize,
    },
    Failed {
        error: String,
        worker_id: usize,
    },
}

/// A stats snapshot pushed at most every [`STATS_CADENCE`].
#[derive(Debug, Clone, Copy)]
pub struct StatsTick {
    pub worker_id: usize,
    pub attempts: u64,
    pub elapsed_since_start: Duration,
}

/// Worker publishes stats no more often than this.
pub const STATS_CADENCE: Duration = Duration::from_millis(100);

/// Run one worker's lifetime: pull `WorkItem`s off the shared SPMC work
/// channel until the shutdown flag fires or the channel closes.
///
/// `work_rx` is shared across all workers behind a mutex — the standard
/// way to turn an MPSC receiver into an SPMC one without pulling in an
/// extra dependency purely for that. `result_tx` and `stats_tx` are each
/// worker's private clone of the pool's MPSC senders. `items_consumed`,
/// if given, is bumped on every successful receive so the dispatcher can
/// track how many outstanding items remain in flight.
pub fn run_worker(
    worker_id: usize,
    work_rx: &Mutex<Receiver<WorkItem>>,
    result_tx: Sender<WorkResult>,
    stats_tx: SyncSender<StatsTick>,
    shutdown: &AtomicBool,
    items_consumed: Option<&AtomicU64>,
) {
    let mut scratch = CryptoScratch::new();
    let start = Instant::now();
    let mut cumulative_attempts: u64 = 0;
    let mut last_stats_push = Instant::now() - STATS_CADENCE;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let item = {
            let rx = work_rx.lock().unwrap();
            // Block briefly so we notice shutdown promptly rather than
            // parking forever on a channel nobody will feed again.
            rx.recv_timeout(Duration::from_millis(50))
        };

        let item = match item {
            Ok(item) => item,
            Err(_) => continue, // timed out or channel closed; re-check shutdown
        };
        if let Some(counter) = items_consumed {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        // Total attempts made on this `WorkItem`, reported verbatim in the
        // terminal result regardless of how many stats ticks fire along
        // the way. `since_last_stats` is the only counter zeroed on a tick.
        let mut item_attempts: u64 = 0;
        let mut since_last_stats: u64 = 0;
        let mut outcome = None;

        for _ in 0..item.batch_size.max(1) {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let secret = match scratch.sample_secret() {
                Ok(s) => s,
                Err(e) => {
                    outcome = Some(WorkResult::Failed {
                        error: e.to_string(),
                        worker_id,
                    });
                    break;
                }
            };

            let (address, public_key) = match scratch.derive_address(&secret) {
                Ok(pair) => pair,
                Err(e) => {
                    outcome = Some(WorkResult::Failed {
                        error: e.to_string(),
                        worker_id,
                    });
                    break;
                }
            };

            item_attempts += 1;
            since_last_stats += 1;

            let address_hex = crate::crypto::hex_encode_address(&address);
            if item.pattern.matches(&address_hex) {
                let wallet = Wallet::new(secret.0, address, public_key);
                outcome = Some(WorkResult::Found {
                    wallet,
                    attempts_in_batch: item_attempts,
                    worker_id,
                });
                break;
            }

            if last_stats_push.elapsed() >= STATS_CADENCE {
                cumulative_attempts += since_last_stats;
                since_last_stats = 0;
                let _ = stats_tx.try_send(StatsTick {
                    worker_id,
                    attempts: cumulative_attempts,
                    elapsed_since_start: start.elapsed(),
                });
                last_stats_push = Instant::now();
            }
        }

        cumulative_attempts += since_last_stats;

        let result = outcome.unwrap_or(WorkResult::NotFound {
            attempts_in_batch: item_attempts,
            worker_id,
        });

        match result {
            // A Found result must not be lost: block (briefly) rather
            // than drop it under backpressure.
            found @ WorkResult::Found { .. } => {
                let _ = result_tx.send(found);
                break;
            }
            other => {
                // NotFound/Failed may be dropped under backpressure.
                let _ = result_tx.send(other);
            }
        }
    }

    // Final stats push on the way out, best-effort.
    let _ = stats_tx.try_send(StatsTick {
        worker_id,
        attempts: cumulative_attempts,
        elapsed_since_start: start.elapsed(),
    });
}

/// True if sending to a lossy stats channel failed only because it's
/// momentarily full — distinguishing that from a closed channel is
/// occasionally useful for diagnostics, exposed here for tests.
pub fn is_backpressure<T>(err: &TrySendError<T>) -> bool {
    matches!(err, TrySendError::Full(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn worker_finds_trivial_pattern_and_reports_found() {
        let pattern = Arc::new(Pattern::new("", "", false).unwrap());
        let (work_tx, work_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let (stats_tx, _stats_rx) = mpsc::sync_channel(8);
        let shutdown = Arc::new(AtomicBool::new(false));

        work_tx
            .send(WorkItem {
                pattern,
                batch_size: 10,
            })
            .unwrap();

        let work_rx = Mutex::new(work_rx);
        let shutdown = AtomicBool::new(false);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                run_worker(0, &work_rx, result_tx, stats_tx, &shutdown, None);
            });

            let result = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            match result {
                WorkResult::Found { attempts_in_batch, .. } => {
                    assert_eq!(attempts_in_batch, 1);
                }
                _ => panic!("expected Found on an always-matching pattern"),
            }

            shutdown.store(true, Ordering::Relaxed);
        });
    }

    #[test]
    fn worker_reports_not_found_when_batch_exhausted() {
        // A pattern that (practically) cannot match within a tiny batch.
        let pattern = Arc::new(Pattern::new("0".repeat(10), "".to_string(), false).unwrap());
        let (work_tx, work_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let (stats_tx, _stats_rx) = mpsc::sync_channel(8);
        let shutdown = Arc::new(AtomicBool::new(false));

        work_tx
            .send(WorkItem {
                pattern,
                batch_size: 5,
            })
            .unwrap();

        let work_rx = Mutex::new(work_rx);
        let shutdown = AtomicBool::new(false);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                run_worker(0, &work_rx, result_tx, stats_tx, &shutdown, None);
            });

            let result = result_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            match result {
                WorkResult::NotFound { attempts_in_batch, .. } => {
                    assert_eq!(attempts_in_batch, 5);
                }
                WorkResult::Found { .. } => {
                    // astronomically unlikely but not a test bug
                }
                WorkResult::Failed { error, .. } => panic!("unexpected failure: {error}"),
            }

            shutdown.store(true, Ordering::Relaxed);
        });
    }

    #[test]
    fn shutdown_before_any_work_item_exits_cleanly() {
        let (_work_tx, work_rx) = mpsc::channel::<WorkItem>();
        let (result_tx, _result_rx) = mpsc::channel();
        let (stats_tx, _stats_rx) = mpsc::sync_channel(8);
        let shutdown = AtomicBool::new(true);

        let work_rx = Mutex::new(work_rx);
        run_worker(0, &work_rx, result_tx, stats_tx, &shutdown, None);
        // reaching here without hanging is the assertion
    }
}
