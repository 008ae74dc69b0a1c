#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::worker::{DEFAULT_MAX_WRITE_ATTEMPTS, DEFAULT_WORKERS};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATH: &str = "Before Eod.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "After Eod.csv";
pub const MAX_WORKERS: usize = 1024;
pub const MAX_WRITE_ATTEMPTS: u32 = 100;
pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;

/// 一次執行所需的全部設定，建立 engine 時明確傳入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EodConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub workers: usize,
    /// 0 表示盡量接近無緩衝的佇列
    pub queue_capacity: usize,
    pub max_write_attempts: u32,
    pub monitor: bool,
}

impl Default for EodConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            workers: DEFAULT_WORKERS,
            queue_capacity: 0,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            monitor: false,
        }
    }
}

impl ConfigProvider for EodConfig {
    fn input_path(&self) -> &Path {
        &self.input_path
    }

    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
    }
}

impl Validate for EodConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_path", &self.input_path)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_distinct_paths(&self.input_path, &self.output_path)?;
        validation::validate_range("workers", self.workers, 1, MAX_WORKERS)?;
        validation::validate_range(
            "queue_capacity",
            self.queue_capacity,
            0,
            MAX_QUEUE_CAPACITY,
        )?;
        validation::validate_range(
            "max_write_attempts",
            self.max_write_attempts,
            1,
            MAX_WRITE_ATTEMPTS,
        )?;
        Ok(())
    }
}
