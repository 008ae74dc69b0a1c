pub mod barrier;
pub mod etl;
pub mod sink;
pub mod source;
pub mod transform;
pub mod worker;

pub use crate::domain::model::{InputRecord, OutputRow, RunSummary, Transformed};
pub use crate::domain::ports::{ConfigProvider, RecordSource, ResultSink};
pub use crate::utils::error::Result;
