use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records per chunk for the scan/assign passes.
    pub chunk_size: usize,
    /// Minimum per-field completeness (percent) the validator accepts.
    pub completeness_threshold: f64,
    /// Accepted duration window, minutes.
    pub duration_min: u32,
    pub duration_max: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Source adapter names in priority order.
    pub enabled_sources: Vec<String>,
    /// Minimum delay between consecutive outbound queries, shared by all workers.
    pub rate_delay_ms: u64,
    /// Per-query timeout.
    pub timeout_seconds: u64,
    /// Concurrent canonical movies in flight.
    pub concurrency: usize,
    pub cache_path: String,
    /// Persist the cache after this many new entries.
    pub cache_save_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50_000,
            completeness_threshold: 95.0,
            duration_min: 30,
            duration_max: 999,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled_sources: vec![
                "cinepolis".to_string(),
                "wikipedia".to_string(),
                "imdb".to_string(),
            ],
            rate_delay_ms: 500,
            timeout_seconds: 10,
            concurrency: 4,
            cache_path: "movie_cache.json".to_string(),
            cache_save_interval: 25,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl Config {
    /// Loads config.toml from the working directory, falling back to defaults
    /// when the file is absent. A present-but-malformed file is a configuration
    /// error, not a silent fallback.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
