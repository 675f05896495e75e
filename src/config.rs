//! On-disk configuration: a plain serde-derived struct with a
//! `Default` impl and JSON load/save helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A 100 ms stats cadence and a 5 s drain timeout, matching the
/// worker pool's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 0 means auto-detect via available parallelism.
    pub threads: usize,
    pub batch_size_override: Option<u32>,
    pub stats_interval_ms: u64,
    pub drain_timeout_ms: u64,
    pub safety_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size_override: None,
            stats_interval_ms: 100,
            drain_timeout_ms: 5_000,
            safety_timeout_secs: 86_400,
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let data = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&data)?;
    Ok(config)
}

pub fn save_config(config: &Config, path: impl AsRef<Path>) -> Result<()> {
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data)?;
    Ok(())
}
