use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// 尚未處理完的工作計數。producer 入列前 `add`，worker 寫完一列後 `done`，
/// coordinator 以 `wait` 等待歸零（或有 worker 發生致命錯誤而 `abort`）。
#[derive(Debug, Default)]
pub struct PendingWork {
    outstanding: AtomicUsize,
    aborted: AtomicBool,
    notify: Notify,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.outstanding.fetch_add(n, Ordering::AcqRel);
    }

    pub fn done(&self) {
        let prev = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "PendingWork::done called more times than add");
        if prev == 1 {
            self.notify.notify_waiters();
        }
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// 直到有人呼叫 `abort` 才完成
    pub async fn aborted(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }

    /// 回傳 `true` 表示計數歸零；`false` 表示被中止
    pub async fn wait(&self) -> bool {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // 先註冊再檢查，避免錯過 notify_waiters
            notified.as_mut().enable();

            if self.is_aborted() {
                return false;
            }
            if self.outstanding() == 0 {
                return true;
            }
            notified.await;
        }
    }
}
