//! 访问记录管道
//!
//! 有界队列 + 后台 worker 池：入队永不阻塞调用方，队列满时丢弃新
//! 记录并累加 dropped 计数；worker 按批取出，聚合计数后交给 sink。
//! sink 失败（含重试耗尽）只丢这一批并记日志，绝不向解析路径传播。

use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::analytics::VisitSink;
use crate::config::VisitConfig;
use crate::storage::Visit;

pub struct VisitRecorder {
    tx: mpsc::Sender<Visit>,
    queue_capacity: usize,
    /// 丢弃总数（溢出 + 落库最终失败），单调递增
    dropped: Arc<AtomicU64>,
    flushed: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    closing: Arc<AtomicBool>,
}

impl VisitRecorder {
    /// 启动 worker 池并返回入队句柄
    pub fn start(sink: Arc<dyn VisitSink>, config: &VisitConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Visit>(config.queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let dropped = Arc::new(AtomicU64::new(0));
        let flushed = Arc::new(AtomicU64::new(0));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let workers = config.workers.max(1);
        let batch_size = config.batch_size.max(1);
        for worker_id in 0..workers {
            tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&rx),
                Arc::clone(&sink),
                batch_size,
                Arc::clone(&dropped),
                Arc::clone(&flushed),
                Arc::clone(&in_flight),
            ));
        }

        debug!(
            "VisitRecorder started: capacity={}, workers={}, batch_size={}",
            config.queue_capacity, workers, batch_size
        );

        Self {
            tx,
            queue_capacity: config.queue_capacity,
            dropped,
            flushed,
            in_flight,
            closing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 入队一条访问记录；只做 try_send，满了丢新来的
    pub fn record(&self, visit: Visit) {
        if self.closing.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        match self.tx.try_send(visit) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!("Visit queue full, record dropped (total dropped: {})", total);
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// 累计丢弃数（可观测性指标）
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 累计成功落库数
    pub fn flushed_count(&self) -> u64 {
        self.flushed.load(Ordering::Relaxed)
    }

    /// 停收新记录并在宽限期内排空队列；返回累计落库数。
    /// 宽限期结束仍未排空的记录不再等待。
    pub async fn shutdown(&self, grace: Duration) -> u64 {
        self.closing.store(true, Ordering::Release);
        info!("VisitRecorder draining (grace: {:?})", grace);

        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let queue_empty = self.tx.capacity() == self.queue_capacity;
            if queue_empty && self.in_flight.load(Ordering::Acquire) == 0 {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    "Visit queue not drained within grace period, {} records pending",
                    self.queue_capacity - self.tx.capacity()
                );
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }

        self.flushed_count()
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Visit>>>,
    sink: Arc<dyn VisitSink>,
    batch_size: usize,
    dropped: Arc<AtomicU64>,
    flushed: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
) {
    loop {
        // 批量取出；锁只覆盖出队，不覆盖落库
        let batch = {
            let mut rx = rx.lock().await;
            let Some(first) = rx.recv().await else {
                break;
            };
            in_flight.fetch_add(1, Ordering::AcqRel);

            let mut batch = Vec::with_capacity(batch_size);
            batch.push(first);
            while batch.len() < batch_size {
                match rx.try_recv() {
                    Ok(visit) => batch.push(visit),
                    Err(_) => break,
                }
            }
            batch
        };

        let count = batch.len();
        let counts = aggregate_counts(&batch);

        match sink.flush_visits(batch, counts).await {
            Ok(()) => {
                flushed.fetch_add(count as u64, Ordering::Relaxed);
                trace!("Visit worker {} flushed {} records", worker_id, count);
            }
            Err(e) => {
                // 重试在 sink 内部做完了，这批只能丢
                dropped.fetch_add(count as u64, Ordering::Relaxed);
                warn!(
                    "Visit worker {} dropped {} records after sink failure: {}",
                    worker_id, count, e
                );
            }
        }

        in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    debug!("Visit worker {} stopped", worker_id);
}

/// 按 link_id 聚合一批记录的计数增量
fn aggregate_counts(batch: &[Visit]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for visit in batch {
        *counts.entry(visit.link_id.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(id, n)| (id.to_string(), n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::sync::Notify;

    fn test_visit(link_id: &str) -> Visit {
        Visit {
            link_id: link_id.to_string(),
            visited_at: Utc::now(),
            referrer_class: Some("direct".to_string()),
            device_class: None,
            browser_class: None,
            country: None,
        }
    }

    fn test_config(capacity: usize) -> VisitConfig {
        VisitConfig {
            queue_capacity: capacity,
            workers: 1,
            batch_size: 16,
            shutdown_grace_secs: 1,
        }
    }

    struct MockSink {
        visits: std::sync::Mutex<Vec<Visit>>,
        counts: std::sync::Mutex<Vec<(String, usize)>>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                visits: std::sync::Mutex::new(Vec::new()),
                counts: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn total_visits(&self) -> usize {
            self.visits.lock().unwrap().len()
        }

        fn total_counted(&self) -> usize {
            self.counts.lock().unwrap().iter().map(|(_, n)| n).sum()
        }
    }

    #[async_trait::async_trait]
    impl VisitSink for MockSink {
        async fn flush_visits(
            &self,
            visits: Vec<Visit>,
            counts: Vec<(String, usize)>,
        ) -> anyhow::Result<()> {
            self.visits.lock().unwrap().extend(visits);
            self.counts.lock().unwrap().extend(counts);
            Ok(())
        }
    }

    /// sink 在放行前一直阻塞，用于制造队列堆积
    struct BlockedSink {
        release: Notify,
    }

    #[async_trait::async_trait]
    impl VisitSink for BlockedSink {
        async fn flush_visits(
            &self,
            _visits: Vec<Visit>,
            _counts: Vec<(String, usize)>,
        ) -> anyhow::Result<()> {
            self.release.notified().await;
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait::async_trait]
    impl VisitSink for FailingSink {
        async fn flush_visits(
            &self,
            _visits: Vec<Visit>,
            _counts: Vec<(String, usize)>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("store unavailable")
        }
    }

    #[tokio::test]
    async fn test_record_and_flush() {
        let sink = Arc::new(MockSink::new());
        let recorder = VisitRecorder::start(Arc::clone(&sink) as Arc<dyn VisitSink>, &test_config(64));

        recorder.record(test_visit("l1"));
        recorder.record(test_visit("l1"));
        recorder.record(test_visit("l2"));

        recorder.shutdown(Duration::from_secs(2)).await;

        assert_eq!(sink.total_visits(), 3);
        assert_eq!(sink.total_counted(), 3);
        assert_eq!(recorder.dropped_count(), 0);
        assert_eq!(recorder.flushed_count(), 3);
    }

    #[tokio::test]
    async fn test_overflow_drops_new_and_counts() {
        let sink = Arc::new(BlockedSink {
            release: Notify::new(),
        });
        let recorder = VisitRecorder::start(Arc::clone(&sink) as Arc<dyn VisitSink>, &test_config(4));

        // 淹没队列：容量 4 + worker 手里的一批，其余必须被丢弃
        for _ in 0..64 {
            recorder.record(test_visit("l1"));
        }

        let dropped = recorder.dropped_count();
        assert!(dropped > 0, "queue overflow must drop records");

        // 丢弃计数只增不减
        for _ in 0..8 {
            recorder.record(test_visit("l1"));
        }
        assert!(recorder.dropped_count() >= dropped);

        sink.release.notify_waiters();
    }

    #[tokio::test]
    async fn test_record_never_blocks_on_full_queue() {
        let sink = Arc::new(BlockedSink {
            release: Notify::new(),
        });
        let recorder = VisitRecorder::start(Arc::clone(&sink) as Arc<dyn VisitSink>, &test_config(2));

        let started = std::time::Instant::now();
        for _ in 0..1000 {
            recorder.record(test_visit("l1"));
        }
        // 1000 次入队全部立即返回
        assert!(started.elapsed() < Duration::from_millis(500));

        sink.release.notify_waiters();
    }

    #[tokio::test]
    async fn test_sink_failure_drops_batch_silently() {
        let recorder = VisitRecorder::start(Arc::new(FailingSink), &test_config(64));

        recorder.record(test_visit("l1"));
        recorder.record(test_visit("l2"));

        recorder.shutdown(Duration::from_secs(2)).await;

        assert_eq!(recorder.flushed_count(), 0);
        assert_eq!(recorder.dropped_count(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_records() {
        let sink = Arc::new(MockSink::new());
        let recorder = VisitRecorder::start(Arc::clone(&sink) as Arc<dyn VisitSink>, &test_config(64));

        recorder.shutdown(Duration::from_secs(1)).await;

        recorder.record(test_visit("l1"));
        assert_eq!(recorder.dropped_count(), 1);
        assert_eq!(sink.total_visits(), 0);
    }

    #[tokio::test]
    async fn test_counts_aggregated_per_link() {
        let batch = vec![test_visit("a"), test_visit("a"), test_visit("b")];
        let mut counts = aggregate_counts(&batch);
        counts.sort();
        assert_eq!(
            counts,
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
    }
}
