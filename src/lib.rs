pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;
pub use crate::config::{toml_config::TomlConfig, EodConfig};

pub use crate::core::{
    etl::EodEngine, sink::CsvResultSink, source::CsvRecordSource, worker::WorkerPool,
};
pub use crate::domain::model::{InputRecord, OutputRow, RunSummary, OUTPUT_HEADER};
pub use crate::utils::error::{EtlError, Result};
