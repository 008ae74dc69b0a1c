use crate::config::EodConfig;
use clap::Parser;
use std::path::PathBuf;

/// 未指定的旗標沿用設定檔或預設值
#[derive(Debug, Clone, Parser)]
#[command(name = "eod-balance")]
#[command(about = "Compute end-of-day balances for a ';'-delimited account CSV")]
pub struct CliArgs {
    /// Input CSV (default: "Before Eod.csv")
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output CSV (default: "After Eod.csv")
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent workers (default: 8)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Work queue capacity, 0 for the smallest possible buffer
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Attempts per row before a transient write error becomes fatal (default: 3)
    #[arg(long)]
    pub max_write_attempts: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log process CPU and memory usage at each phase
    #[arg(long)]
    pub monitor: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn apply_to(&self, mut config: EodConfig) -> EodConfig {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(attempts) = self.max_write_attempts {
            config.max_write_attempts = attempts;
        }
        if self.monitor {
            config.monitor = true;
        }
        config
    }
}
