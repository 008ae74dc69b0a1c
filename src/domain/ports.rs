use crate::domain::model::{InputRecord, OutputRow};
use crate::utils::error::Result;
use std::path::Path;

/// 逐筆產生輸入資料；`Ok(None)` 代表已讀到檔尾
pub trait RecordSource: Send {
    fn next_record(&mut self) -> Result<Option<InputRecord>>;
}

/// 所有 worker 共用的輸出端，實作必須自行保證寫入互斥
pub trait ResultSink: Send + Sync {
    fn write_header(&self, header: &[&str]) -> impl std::future::Future<Output = Result<()>> + Send;
    fn write_row(&self, row: &OutputRow) -> impl std::future::Future<Output = Result<()>> + Send;
    fn flush(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    fn close(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &Path;
    fn output_path(&self) -> &Path;
    fn workers(&self) -> usize;
    fn queue_capacity(&self) -> usize;
    fn max_write_attempts(&self) -> u32;
}
