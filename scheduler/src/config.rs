//! Application configuration: optional JSON file overlaid by `GEO_*` variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use executor::BatchOptions;
use shared::ExecutionConfig;

use crate::error::{SchedulerError, SchedulerResult};

/// Settings of the `geo-tracker` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON snapshot file of the store; in-memory only when unset
    pub store_path: Option<PathBuf>,
    /// Exclusion word file; the bundled list when unset
    pub exclusion_words: Option<PathBuf>,
    pub tick_seconds: u64,
    pub worker_pool_size: usize,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub call_timeout_seconds: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            exclusion_words: None,
            tick_seconds: 60,
            worker_pool_size: 4,
            max_retries: 3,
            retry_delay_seconds: 5,
            call_timeout_seconds: 120,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read `path` if given, then apply environment overrides
    pub fn load(path: Option<&Path>) -> SchedulerResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> SchedulerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::config(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| SchedulerError::config(path.display().to_string(), e.to_string()))
    }

    /// Overlay `GEO_*` values returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> SchedulerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("GEO_STORE_PATH") {
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("GEO_EXCLUSION_WORDS") {
            self.exclusion_words = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("GEO_LOG_LEVEL") {
            self.log_level = level;
        }
        override_parsed(&lookup, "GEO_TICK_SECONDS", &mut self.tick_seconds)?;
        override_parsed(&lookup, "GEO_WORKER_POOL_SIZE", &mut self.worker_pool_size)?;
        override_parsed(&lookup, "GEO_MAX_RETRIES", &mut self.max_retries)?;
        override_parsed(&lookup, "GEO_RETRY_DELAY_SECONDS", &mut self.retry_delay_seconds)?;
        override_parsed(&lookup, "GEO_CALL_TIMEOUT_SECONDS", &mut self.call_timeout_seconds)?;

        if self.tick_seconds == 0 {
            return Err(SchedulerError::config("tick_seconds", "must be at least 1"));
        }
        if self.worker_pool_size == 0 {
            return Err(SchedulerError::config("worker_pool_size", "must be at least 1"));
        }
        Ok(())
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay_seconds),
            call_timeout: Duration::from_secs(self.call_timeout_seconds),
            ..ExecutionConfig::default()
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            config: self.execution_config(),
            worker_pool_size: self.worker_pool_size,
            ..BatchOptions::default()
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> SchedulerResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e: T::Err| SchedulerError::config(key, format!("'{}': {}", raw, e)))?;
    }
    Ok(())
}
