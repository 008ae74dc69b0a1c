use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Output file unavailable: {}", path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Result sink is closed")]
    SinkClosed,

    #[error("Row {record_id} could not be written after {attempts} attempts: {last_error}")]
    WriteRetriesExhausted {
        record_id: i64,
        attempts: u32,
        last_error: String,
    },

    #[error("Work queue closed before record {record_id} could be dispatched")]
    QueueClosed { record_id: i64 },

    #[error("Worker task failed: {message}")]
    WorkerPanicked { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Output,
    Concurrency,
    Configuration,
}

/// 錯誤嚴重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::CsvError(_) | EtlError::InputNotFound { .. } => ErrorCategory::Input,
            EtlError::IoError(_)
            | EtlError::OutputUnavailable { .. }
            | EtlError::SinkClosed
            | EtlError::WriteRetriesExhausted { .. } => ErrorCategory::Output,
            EtlError::QueueClosed { .. } | EtlError::WorkerPanicked { .. } => {
                ErrorCategory::Concurrency
            }
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::WriteRetriesExhausted { .. } | EtlError::QueueClosed { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::High,
            EtlError::CsvError(_) | EtlError::InputNotFound { .. } => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::OutputUnavailable { .. }
            | EtlError::SinkClosed
            | EtlError::WorkerPanicked { .. } => ErrorSeverity::Critical,
        }
    }

    /// 只有底層 IO 的暫時性錯誤值得重試
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::IoError(e) => is_transient_io(e),
            EtlError::CsvError(e) => match e.kind() {
                csv::ErrorKind::Io(io) => is_transient_io(io),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the input file exists and is a ';'-delimited CSV",
            ErrorCategory::Output => {
                "Check that the output directory exists and is writable, and that the disk is not full"
            }
            ErrorCategory::Concurrency => "Re-run the job; inspect earlier log lines for the first failure",
            ErrorCategory::Configuration => "Review the CLI flags or the TOML configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InputNotFound { path } => format!("file unknown: {}", path.display()),
            EtlError::OutputUnavailable { path, .. } => {
                format!("cannot create output file: {}", path.display())
            }
            EtlError::WriteRetriesExhausted { record_id, .. } => {
                format!("failed to write row for record {}", record_id)
            }
            other => other.to_string(),
        }
    }
}

fn is_transient_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}

pub type Result<T> = std::result::Result<T, EtlError>;
