use crate::core::barrier::PendingWork;
use crate::core::transform::transform;
use crate::domain::model::{InputRecord, OutputRow};
use crate::domain::ports::ResultSink;
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

/// 所有 worker 共用同一個接收端
pub type WorkQueue = Arc<Mutex<mpsc::Receiver<InputRecord>>>;

/// 寫入失敗的重試次數上限，不做 backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WRITE_ATTEMPTS)
    }
}

pub struct WorkerPool<K: ResultSink + 'static> {
    workers: usize,
    sink: Arc<K>,
    pending: Arc<PendingWork>,
    retry: RetryPolicy,
}

impl<K: ResultSink + 'static> WorkerPool<K> {
    pub fn new(workers: usize, sink: Arc<K>, pending: Arc<PendingWork>, retry: RetryPolicy) -> Self {
        Self {
            workers,
            sink,
            pending,
            retry,
        }
    }

    /// 啟動剛好 `workers` 個 task，編號 0..workers。每個 handle 回傳該 worker 寫出的列數
    pub fn spawn(&self, rx: mpsc::Receiver<InputRecord>) -> Vec<JoinHandle<Result<u64>>> {
        let queue: WorkQueue = Arc::new(Mutex::new(rx));

        (0..self.workers)
            .map(|worker_id| {
                let queue = queue.clone();
                let sink = self.sink.clone();
                let pending = self.pending.clone();
                let retry = self.retry;
                tokio::spawn(async move { worker_loop(worker_id, queue, sink, pending, retry).await })
            })
            .collect()
    }
}

async fn worker_loop<K: ResultSink>(
    worker_id: usize,
    queue: WorkQueue,
    sink: Arc<K>,
    pending: Arc<PendingWork>,
    retry: RetryPolicy,
) -> Result<u64> {
    debug!("Worker {} started", worker_id);
    let mut processed = 0u64;

    loop {
        if pending.is_aborted() {
            debug!("Worker {} stopping, run aborted", worker_id);
            break;
        }

        // 其他 worker 中止時要放開鎖，否則持鎖等待 recv 會卡住關閉佇列的那一方
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                record = rx.recv() => record,
                _ = pending.aborted() => None,
            }
        };
        let Some(record) = next else {
            break;
        };

        match process_record(worker_id, &record, sink.as_ref(), retry).await {
            Ok(()) => {
                processed += 1;
                pending.done();
            }
            Err(e) => {
                error!("❌ Worker {} failed on record {}: {}", worker_id, record.id, e);
                // 先叫醒 coordinator 與其他 worker，再關閉佇列讓 producer 停止送件
                pending.abort();
                queue.lock().await.close();
                return Err(e);
            }
        }
    }

    debug!("Worker {} stopped after {} rows", worker_id, processed);
    Ok(processed)
}

pub async fn process_record<K: ResultSink>(
    worker_id: usize,
    record: &InputRecord,
    sink: &K,
    retry: RetryPolicy,
) -> Result<()> {
    let derived = transform(record);
    info!(
        "value: {:?} average balanced: {} free transfer: {} pid: {} final balanced: {}",
        record,
        derived.average_balance,
        derived.free_transfer_quota,
        worker_id,
        derived.adjusted_balance
    );

    let row = OutputRow::build(record, &derived, worker_id);

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match sink.write_row(&row).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < retry.max_attempts => {
                warn!(
                    "⚠️ Worker {} retrying record {} (attempt {}/{}): {}",
                    worker_id, record.id, attempt, retry.max_attempts, e
                );
            }
            Err(e) if e.is_retryable() => {
                return Err(EtlError::WriteRetriesExhausted {
                    record_id: record.id,
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 記憶體中的 sink，可設定前 N 次寫入失敗
    #[derive(Default)]
    struct MockSink {
        rows: Mutex<Vec<OutputRow>>,
        failures_left: AtomicU32,
        fatal: bool,
    }

    impl MockSink {
        fn failing(times: u32, fatal: bool) -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                failures_left: AtomicU32::new(times),
                fatal,
            }
        }
    }

    impl ResultSink for MockSink {
        async fn write_header(&self, _header: &[&str]) -> Result<()> {
            Ok(())
        }

        async fn write_row(&self, row: &OutputRow) -> Result<()> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                if self.fatal {
                    return Err(EtlError::SinkClosed);
                }
                return Err(EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "interrupted",
                )));
            }
            self.rows.lock().await.push(row.clone());
            Ok(())
        }

        async fn flush(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn record(id: i64) -> InputRecord {
        InputRecord {
            id,
            name: format!("Account {}", id),
            age: 30,
            balance: 200,
            previous_balance: 100,
            average_balance: 0,
            free_transfer: 1,
        }
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let sink = MockSink::failing(2, false);
        process_record(0, &record(1), &sink, RetryPolicy::new(3))
            .await
            .unwrap();
        assert_eq!(sink.rows.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let sink = MockSink::failing(5, false);
        let err = process_record(0, &record(42), &sink, RetryPolicy::new(3))
            .await
            .unwrap_err();

        match err {
            EtlError::WriteRetriesExhausted {
                record_id,
                attempts,
                ..
            } => {
                assert_eq!(record_id, 42);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.rows.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let sink = MockSink::failing(1, true);
        let err = process_record(0, &record(1), &sink, RetryPolicy::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::SinkClosed));
        // 只消耗了一次失敗額度
        assert_eq!(sink.failures_left.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_retry_policy_minimum_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
        assert_eq!(RetryPolicy::default().max_attempts, DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_pool_spawns_exact_worker_count_and_drains_queue() {
        let sink = Arc::new(MockSink::default());
        let pending = Arc::new(PendingWork::new());
        let pool = WorkerPool::new(4, sink.clone(), pending.clone(), RetryPolicy::default());

        let (tx, rx) = mpsc::channel(2);
        let handles = pool.spawn(rx);
        assert_eq!(handles.len(), 4);

        for id in 1..=100 {
            pending.add(1);
            tx.send(record(id)).await.unwrap();
        }
        drop(tx);

        assert!(pending.wait().await);

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().unwrap();
        }
        assert_eq!(total, 100);

        let rows = sink.rows.lock().await;
        let ids: HashSet<String> = rows.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(rows.len(), 100);
        assert_eq!(ids.len(), 100);

        let worker_ids: HashSet<String> = rows.iter().map(|r| r.fields()[4].clone()).collect();
        assert!(worker_ids.iter().all(|w| w.parse::<usize>().unwrap() < 4));
    }

    #[tokio::test]
    async fn test_worker_failure_aborts_pool() {
        let sink = Arc::new(MockSink::failing(1, true));
        let pending = Arc::new(PendingWork::new());
        let pool = WorkerPool::new(2, sink, pending.clone(), RetryPolicy::default());

        let (tx, rx) = mpsc::channel(1);
        let handles = pool.spawn(rx);

        pending.add(1);
        tx.send(record(1)).await.unwrap();

        assert!(!pending.wait().await);
        assert!(pending.is_aborted());

        let mut errors = 0;
        for handle in handles {
            if handle.await.unwrap().is_err() {
                errors += 1;
            }
        }
        assert_eq!(errors, 1);
        // 佇列已被關閉，producer 端送件會失敗
        assert!(tx.send(record(2)).await.is_err());
    }
}
