//! closed-form difficulty, probability, ETA, and the batch-size
//! heuristic that shapes worker update granularity.

use crate::pattern::Pattern;

/// A point-in-time difficulty readout for a pattern, independent of any
/// running search.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultySnapshot {
    pub pattern: Pattern,
    pub base_difficulty: f64,
    pub checksum_multiplier: f64,
    pub total_difficulty: f64,
    pub attempts_for_50pct: u64,
}

impl DifficultySnapshot {
    pub fn compute(pattern: &Pattern) -> Self {
        let l = pattern.combined_len() as i32;
        let letters = pattern.letter_count() as u32;

        let base_difficulty = 16f64.powi(l);
        let checksum_multiplier = if pattern.checksum {
            2f64.powi(letters as i32)
        } else {
            1.0
        };
        let total_difficulty = base_difficulty * checksum_multiplier;
        let attempts_for_50pct = (std::f64::consts::LN_2 * total_difficulty).round() as u64;

        Self {
            pattern: pattern.clone(),
            base_difficulty,
            checksum_multiplier,
            total_difficulty,
            attempts_for_50pct,
        }
    }

    /// `1 - (1 - 1/total_difficulty)^attempts`, using the large-`total_difficulty`
    /// exponential approximation when that difference would otherwise lose
    /// precision.
    pub fn probability(&self, attempts: u64) -> f64 {
        if self.total_difficulty <= 0.0 {
            return 1.0;
        }
        if self.total_difficulty > 1e9 {
            return 1.0 - (-(attempts as f64) / self.total_difficulty).exp();
        }
        let base = 1.0 - 1.0 / self.total_difficulty;
        1.0 - base.powf(attempts as f64)
    }

    /// Seconds to reach `attempts_for_50pct` at rate `r` addr/s.
    pub fn eta_seconds(&self, rate_addr_per_sec: f64) -> f64 {
        if rate_addr_per_sec <= 0.0 {
            return f64::INFINITY;
        }
        self.attempts_for_50pct as f64 / rate_addr_per_sec
    }
}

/// Wallet-count-basis progress percentage: `100 * completed / total`.
/// Deliberately NOT probability-based — the source's earlier probability-
/// based progress bar could exceed 100% for hard patterns.
pub fn progress_pct(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * completed as f64 / total as f64
}

/// Step function of `total_difficulty` choosing a worker's batch size,
/// small patterns get frequent stats ticks, large
/// patterns amortize scheduler overhead.
pub fn batch_size_heuristic(total_difficulty: f64) -> u32 {
    if total_difficulty < 1e3 {
        100
    } else if total_difficulty < 1e4 {
        500
    } else if total_difficulty < 1e5 {
        1_000
    } else if total_difficulty < 1e6 {
        5_000
    } else {
        10_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(prefix: &str, suffix: &str, checksum: bool) -> Pattern {
        Pattern::new(prefix, suffix, checksum).unwrap()
    }

    #[test]
    fn base_difficulty_is_16_pow_length() {
        let snap = DifficultySnapshot::compute(&pat("ab", "cd", false));
        assert_eq!(snap.base_difficulty, 16f64.powi(4));
        assert_eq!(snap.total_difficulty, 16f64.powi(4));
    }

    #[test]
    fn checksum_multiplies_by_two_pow_letters() {
        // "ab" has 2 letters, "12" has 0
        let snap = DifficultySnapshot::compute(&pat("ab", "12", true));
        assert_eq!(snap.checksum_multiplier, 4.0);
        assert_eq!(snap.total_difficulty, 16f64.powi(4) * 4.0);
    }

    #[test]
    fn attempts_for_50pct_matches_ln2_rule() {
        let snap = DifficultySnapshot::compute(&pat("a", "", false));
        let expected = (std::f64::consts::LN_2 * 16.0).round() as u64;
        assert_eq!(snap.attempts_for_50pct, expected);
    }

    #[test]
    fn probability_is_monotone_increasing() {
        let snap = DifficultySnapshot::compute(&pat("abcd", "", false));
        let p1 = snap.probability(1_000);
        let p2 = snap.probability(100_000);
        assert!(p2 > p1);
        assert!(p2 <= 1.0);
    }

    #[test]
    fn progress_pct_is_wallet_count_basis() {
        assert_eq!(progress_pct(1, 4), 25.0);
        assert_eq!(progress_pct(4, 4), 100.0);
        assert_eq!(progress_pct(0, 0), 100.0);
    }

    #[test]
    fn batch_size_breakpoints() {
        assert_eq!(batch_size_heuristic(500.0), 100);
        assert_eq!(batch_size_heuristic(5_000.0), 500);
        assert_eq!(batch_size_heuristic(50_000.0), 1_000);
        assert_eq!(batch_size_heuristic(500_000.0), 5_000);
        assert_eq!(batch_size_heuristic(5_000_000.0), 10_000);
    }

    #[test]
    fn eta_seconds_infinite_at_zero_rate() {
        let snap = DifficultySnapshot::compute(&pat("ab", "", false));
        assert!(snap.eta_seconds(0.0).is_infinite());
    }
}
