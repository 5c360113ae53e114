//! 并发回源合并（single-flight）
//!
//! 同一缺失键的并发填充收敛为一次后端读取：首个调用者成为 leader
//! 执行读取并广播结果，其余调用者在有界等待内跟随；leader 卡死或被
//! 取消时，跟随者超时后各自直接回源。

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::trace;

/// 进入一次回源的两种角色
pub enum Flight<T> {
    Leader(FlightLeader<T>),
    Follower(watch::Receiver<Option<T>>),
}

pub struct FlightGroup<T> {
    inflight: Arc<DashMap<String, watch::Receiver<Option<T>>>>,
    wait: Duration,
}

impl<T: Clone + Send + Sync + 'static> FlightGroup<T> {
    pub fn new(wait: Duration) -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
            wait,
        }
    }

    /// 占位或跟随。leader 必须调用 `complete`，否则槽位在 Drop 时释放。
    pub fn begin(&self, key: &str) -> Flight<T> {
        use dashmap::mapref::entry::Entry;

        match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                trace!("Joining in-flight load for key: {}", key);
                Flight::Follower(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Flight::Leader(FlightLeader {
                    key: key.to_string(),
                    tx: Some(tx),
                    inflight: Arc::clone(&self.inflight),
                })
            }
        }
    }

    /// 等待 leader 的结果；超时或 leader 中途消失返回 None，
    /// 调用方退化为直接回源。
    pub async fn wait_for(&self, mut rx: watch::Receiver<Option<T>>) -> Option<T> {
        let outcome = tokio::time::timeout(self.wait, async move {
            loop {
                if let Some(value) = rx.borrow().clone() {
                    return Some(value);
                }
                if rx.changed().await.is_err() {
                    // leader 未广播即退出
                    return rx.borrow().clone();
                }
            }
        })
        .await;

        outcome.ok().flatten()
    }
}

/// leader 持有的槽位，读取期间存活；不跨策略评估持有
pub struct FlightLeader<T> {
    key: String,
    tx: Option<watch::Sender<Option<T>>>,
    inflight: Arc<DashMap<String, watch::Receiver<Option<T>>>>,
}

impl<T: Clone> FlightLeader<T> {
    /// 释放槽位并向所有跟随者广播结果
    pub fn complete(mut self, value: T) {
        self.inflight.remove(&self.key);
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(value));
        }
    }
}

impl<T> Drop for FlightLeader<T> {
    fn drop(&mut self) {
        // complete 之前被取消：释放槽位，跟随者靠超时兜底
        if self.tx.is_some() {
            self.inflight.remove(&self.key);
        }
    }
}
