use crate::config::MAX_QUEUE_CAPACITY;
use crate::core::barrier::PendingWork;
use crate::core::sink::CsvResultSink;
use crate::core::source::CsvRecordSource;
use crate::core::worker::{RetryPolicy, WorkerPool};
use crate::domain::model::{InputRecord, RunSummary, OUTPUT_HEADER};
use crate::domain::ports::{ConfigProvider, RecordSource, ResultSink};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Dispatching,
    Draining,
    Done,
}

/// 讀檔 → 佇列 → worker pool → 輸出檔
pub struct EodEngine<C: ConfigProvider> {
    config: C,
    monitor: SystemMonitor,
}

impl<C: ConfigProvider> EodEngine<C> {
    pub fn new(config: C) -> Self {
        Self::new_with_monitoring(config, false)
    }

    pub fn new_with_monitoring(config: C, monitor_enabled: bool) -> Self {
        Self {
            config,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 開啟設定中的輸入與輸出檔後執行。失敗時刪除已寫出一部分的輸出檔
    pub async fn run(&self) -> Result<RunSummary> {
        self.queue_capacity()?;
        let source = CsvRecordSource::from_path(self.config.input_path())?;
        let output_path = self.config.output_path();
        let sink = CsvResultSink::create(output_path)?;

        let result = self.run_with(source, sink).await;
        if result.is_err() {
            match std::fs::remove_file(output_path) {
                Ok(()) => tracing::warn!("🗑️ Removed partial output {}", output_path.display()),
                Err(e) => tracing::warn!(
                    "⚠️ Could not remove partial output {}: {}",
                    output_path.display(),
                    e
                ),
            }
        }
        result
    }

    /// tokio 的 bounded channel 容量有上限，超過會 panic
    fn queue_capacity(&self) -> Result<usize> {
        let capacity = self.config.queue_capacity();
        validation::validate_range("queue_capacity", capacity, 0, MAX_QUEUE_CAPACITY)?;
        // 容量 0 代表盡量接近無緩衝
        Ok(capacity.max(1))
    }

    pub async fn run_with<R, K>(&self, source: R, sink: K) -> Result<RunSummary>
    where
        R: RecordSource + 'static,
        K: ResultSink + 'static,
    {
        let capacity = self.queue_capacity()?;
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.config.workers();

        let mut state = EngineState::Init;
        tracing::info!("🚀 Starting EOD run with {} workers", workers);
        sink.write_header(&OUTPUT_HEADER).await?;
        self.monitor.log_stats("Init");

        let sink = Arc::new(sink);
        let pending = Arc::new(PendingWork::new());
        let (tx, rx) = mpsc::channel(capacity);

        state = transition(state, EngineState::Dispatching);
        let pool = WorkerPool::new(
            workers,
            sink.clone(),
            pending.clone(),
            RetryPolicy::new(self.config.max_write_attempts()),
        );
        let handles = pool.spawn(rx);

        let producer = {
            let pending = pending.clone();
            tokio::task::spawn_blocking(move || produce(source, tx, &pending))
        };
        let produced = match producer.await {
            Ok(result) => result,
            Err(e) => Err(EtlError::WorkerPanicked {
                message: format!("producer: {}", e),
            }),
        };
        self.monitor.log_stats("Dispatching");

        // producer 結束時 sender 已被 drop，佇列關閉；worker 取完剩餘工作後自行結束
        state = transition(state, EngineState::Draining);
        let (rows_written, worker_error) = join_workers(handles, &pending).await;
        let drained = pending.wait().await;

        if let Some(e) = worker_error {
            return Err(e);
        }
        let records_read = produced?;
        if !drained {
            return Err(EtlError::WorkerPanicked {
                message: format!("{} records left unprocessed", pending.outstanding()),
            });
        }
        self.monitor.log_stats("Draining");

        sink.flush().await?;
        sink.close().await?;
        transition(state, EngineState::Done);

        let summary = RunSummary {
            records_read,
            rows_written,
            workers,
            started_at,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "✅ {} records read, {} rows written (run started {})",
            summary.records_read,
            summary.rows_written,
            summary.started_at.to_rfc3339()
        );
        self.monitor.log_final_stats();

        Ok(summary)
    }
}

fn transition(from: EngineState, to: EngineState) -> EngineState {
    tracing::debug!("Engine state {:?} -> {:?}", from, to);
    to
}

/// 在 blocking 執行緒上逐筆讀取並送入佇列，回傳入列筆數
fn produce<R: RecordSource>(
    mut source: R,
    tx: mpsc::Sender<InputRecord>,
    pending: &PendingWork,
) -> Result<u64> {
    let mut enqueued = 0u64;

    while let Some(record) = source.next_record()? {
        let record_id = record.id;
        pending.add(1);
        if tx.blocking_send(record).is_err() {
            pending.done();
            return Err(EtlError::QueueClosed { record_id });
        }
        enqueued += 1;
    }

    tracing::debug!("Source exhausted after {} records", enqueued);
    Ok(enqueued)
}

/// 等所有 worker 結束，回傳寫出總列數與第一個錯誤。
/// panic 的 worker 不會呼叫 `done`，因此改由這裡中止計數器
async fn join_workers(
    handles: Vec<JoinHandle<Result<u64>>>,
    pending: &PendingWork,
) -> (u64, Option<EtlError>) {
    let mut rows = 0u64;
    let mut first_error = None;

    for (worker_id, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                pending.abort();
                Err(EtlError::WorkerPanicked {
                    message: format!("worker {}: {}", worker_id, e),
                })
            }
        };

        match result {
            Ok(n) => rows += n,
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    (rows, first_error)
}
