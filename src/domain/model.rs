use chrono::{DateTime, Utc};
use std::time::Duration;

/// 輸出檔固定的 11 欄表頭
pub const OUTPUT_HEADER: [&str; 11] = [
    "id",
    "Nama",
    "Age",
    "Balanced",
    "No 2b Thread-No",
    "No 3 Thread-No",
    "Previous Balanced",
    "Average Balanced",
    "No 1 Thread-No",
    "Free Transfer",
    "No 2a Thread-No",
];

/// Before-EOD 檔中的一筆帳戶資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub balance: i64,
    pub previous_balance: i64,
    /// 輸入中的值不會被使用，輸出時以計算結果取代
    pub average_balance: i64,
    pub free_transfer: i64,
}

/// 三個衍生欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformed {
    pub average_balance: i64,
    pub free_transfer_quota: i64,
    pub adjusted_balance: i64,
}

/// 一列輸出，內容在建立時即固定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    fields: [String; 11],
}

impl OutputRow {
    /// worker 編號寫入四個 "Thread-No" 欄位，屬除錯用途而非業務資料
    pub fn build(record: &InputRecord, derived: &Transformed, worker_id: usize) -> Self {
        let worker = worker_id.to_string();
        Self {
            fields: [
                record.id.to_string(),
                record.name.clone(),
                record.age.to_string(),
                derived.adjusted_balance.to_string(),
                worker.clone(),
                worker.clone(),
                record.previous_balance.to_string(),
                derived.average_balance.to_string(),
                worker.clone(),
                derived.free_transfer_quota.to_string(),
                worker,
            ],
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn id(&self) -> &str {
        &self.fields[0]
    }
}

/// 一次執行的結果摘要
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub records_read: u64,
    pub rows_written: u64,
    pub workers: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// 以秒為單位並無條件進位
    pub fn elapsed_secs_ceil(&self) -> u64 {
        let secs = self.elapsed.as_secs();
        if self.elapsed.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}
