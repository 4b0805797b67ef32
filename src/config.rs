//! Configuration of the device executor.

use crate::error::{Error, Result};
use std::env;

/// Environment variable read by `ExecutorConfig::from_env`.
pub const NUM_THREADS_ENV: &str = "TESSELLATE_NUM_THREADS";

/// Configuration of the thread pool that runs kernel blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Number of worker threads, `None` lets rayon pick one per core.
    pub num_threads: Option<usize>,
    /// Prefix of the worker thread names.
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name: "tessellate-block".to_string(),
        }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Default configuration overridden by `TESSELLATE_NUM_THREADS` if set.
    pub fn from_env() -> Result<Self> {
        let config = Self::default();
        match env::var(NUM_THREADS_ENV) {
            Ok(value) => config.parse_num_threads(&value),
            Err(env::VarError::NotPresent) => Ok(config),
            Err(env::VarError::NotUnicode(_)) => Err(Error::invalid_config(format!(
                "{} is not valid unicode",
                NUM_THREADS_ENV
            ))),
        }
    }

    fn parse_num_threads(self, value: &str) -> Result<Self> {
        match value.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(Error::invalid_config(format!(
                "{} must be a positive integer, got {:?}",
                NUM_THREADS_ENV, value
            ))),
            Ok(n) => Ok(self.with_num_threads(n)),
        }
    }
}
