mod completions;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use vanity_forge::{
    orchestrator, CancelToken, DifficultySnapshot, NullResultSink, Pattern, StatsAggregator,
    WorkerPool,
};

#[derive(Parser)]
#[command(name = "vanity-forge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parallel Ethereum vanity address generator")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for one or more addresses matching a prefix/suffix.
    Find {
        /// Required hex prefix (case-insensitive unless --checksum).
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Required hex suffix (case-insensitive unless --checksum).
        #[arg(short, long, default_value = "")]
        suffix: String,
        /// Match prefix/suffix casing against the EIP-55 checksum.
        #[arg(long)]
        checksum: bool,
        /// How many matching wallets to find.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Worker thread count; 0 auto-detects.
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
    /// Run the worker pool for a fixed attempt budget and report speed.
    Benchmark {
        #[arg(short, long, default_value = "")]
        prefix: String,
        #[arg(short, long, default_value = "")]
        suffix: String,
        #[arg(long)]
        checksum: bool,
        /// Minimum attempts to run before reporting.
        #[arg(short, long, default_value_t = 25_000)]
        attempts: u64,
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
    },
    /// Print the closed-form difficulty/ETA model for a pattern.
    Difficulty {
        #[arg(short, long, default_value = "")]
        prefix: String,
        #[arg(short, long, default_value = "")]
        suffix: String,
        #[arg(long)]
        checksum: bool,
        /// Assumed search rate in addresses/sec, for the ETA estimate.
        #[arg(short, long, default_value_t = 1_000_000.0)]
        rate: f64,
    },
    /// Print shell completions for this binary to stdout.
    Completions {
        #[arg(value_parser = ["bash", "zsh", "fish", "powershell"])]
        shell: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Find {
            prefix,
            suffix,
            checksum,
            count,
            threads,
        } => run_find(prefix, suffix, checksum, count, threads),
        Command::Benchmark {
            prefix,
            suffix,
            checksum,
            attempts,
            threads,
        } => run_benchmark(prefix, suffix, checksum, attempts, threads),
        Command::Difficulty {
            prefix,
            suffix,
            checksum,
            rate,
        } => run_difficulty(prefix, suffix, checksum, rate),
        Command::Completions { shell } => completions::print_to_stdout(&shell),
    }
}

fn run_find(prefix: String, suffix: String, checksum: bool, count: usize, threads: usize) -> Result<()> {
    let pattern = Arc::new(Pattern::new(prefix, suffix, checksum)?);
    let snapshot = DifficultySnapshot::compute(&pattern);
    println!(
        "{}",
        format!(
            "searching: total difficulty ~{:.0}, ~{} attempts for 50% odds",
            snapshot.total_difficulty, snapshot.attempts_for_50pct
        )
        .cyan()
    );

    let pool = WorkerPool::new(threads);
    let cancel = CancelToken::new();
    let stats = StatsAggregator::new();
    let mut sink = NullResultSink;

    let summary = orchestrator::generate_many(&pool, pattern, count, &cancel, &stats, &mut sink);

    for wallet in &summary.per_wallet {
        println!(
            "{} 0x{} {}",
            format!("[{}]", wallet.index).green(),
            wallet.address_hex,
            format!("({} attempts, {:.2?})", wallet.attempts, wallet.duration).dimmed()
        );
    }

    if summary.successes < count {
        eprintln!(
            "{}",
            format!(
                "stopped early: {}/{} wallets found before cancellation",
                summary.successes, count
            )
            .yellow()
        );
    }

    Ok(())
}

fn run_benchmark(
    prefix: String,
    suffix: String,
    checksum: bool,
    attempts: u64,
    threads: usize,
) -> Result<()> {
    let pattern = Arc::new(Pattern::new(prefix, suffix, checksum)?);
    let pool = WorkerPool::new(threads);
    let cancel = CancelToken::new();
    let stats = StatsAggregator::new();

    println!(
        "{}",
        format!("benchmarking on {} threads for {} attempts...", pool.thread_count(), attempts).cyan()
    );

    let result = orchestrator::benchmark(&pool, pattern, attempts, &cancel, &stats);

    println!(
        "{}",
        format!(
            "total_attempts={} total_speed={:.0}/s speedup={:.2}x efficiency={:.2} balance={:.2}",
            result.metrics.total_attempts,
            result.metrics.total_speed,
            result.metrics.speedup_vs_single_thread,
            result.metrics.efficiency_ratio,
            result.metrics.thread_balance_score,
        )
        .green()
    );
    println!(
        "speed samples: min={:.0}/s max={:.0}/s stddev={:.0}",
        result.min_speed, result.max_speed, result.stddev_speed
    );

    Ok(())
}

fn run_difficulty(prefix: String, suffix: String, checksum: bool, rate: f64) -> Result<()> {
    let pattern = Pattern::new(prefix, suffix, checksum)?;
    let snapshot = DifficultySnapshot::compute(&pattern);

    println!("base_difficulty:      {:.0}", snapshot.base_difficulty);
    println!("checksum_multiplier:  {:.0}", snapshot.checksum_multiplier);
    println!("total_difficulty:     {:.0}", snapshot.total_difficulty);
    println!("attempts_for_50pct:   {}", snapshot.attempts_for_50pct);
    println!(
        "eta_at_{:.0}_per_sec:    {:.1}s",
        rate,
        snapshot.eta_seconds(rate)
    );

    Ok(())
}
