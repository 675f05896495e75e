//! Parallel Ethereum vanity address generation: secp256k1 key sampling,
//! Keccak-256 address derivation, prefix/suffix pattern matching with
//! optional EIP-55 checksum discipline, and a worker-pool scheduler
//! that coordinates the search across OS threads.

pub mod config;
pub mod crypto;
pub mod difficulty;
pub mod error;
pub mod orchestrator;
pub mod pattern;
pub mod pool;
pub mod stats;
pub mod wallet;
pub mod worker;

pub use config::Config;
pub use difficulty::DifficultySnapshot;
pub use error::{Result, VanityError};
pub use orchestrator::{
    benchmark, difficulty, generate_many, generate_one, NullResultSink, PublishedResult,
    ResultSink, StatsSink, Summary, WalletSummary,
};
pub use pattern::Pattern;
pub use pool::{BenchmarkResult, CancelToken, PoolState, WorkerPool};
pub use stats::{AggregateMetrics, StatsAggregator, WorkerStats};
pub use wallet::Wallet;
