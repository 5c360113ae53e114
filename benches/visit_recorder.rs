//! VisitRecorder 入队热路径基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::sync::Arc;

use linkgate::analytics::{VisitRecorder, VisitSink};
use linkgate::config::VisitConfig;
use linkgate::storage::Visit;

/// 空 sink，只测入队开销
struct NoopSink;

#[async_trait::async_trait]
impl VisitSink for NoopSink {
    async fn flush_visits(
        &self,
        _visits: Vec<Visit>,
        _counts: Vec<(String, usize)>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

fn bench_visit(link_id: &str) -> Visit {
    Visit {
        link_id: link_id.to_string(),
        visited_at: chrono::Utc::now(),
        referrer_class: Some("direct".to_string()),
        device_class: Some("pc".to_string()),
        browser_class: Some("Chrome".to_string()),
        country: None,
    }
}

fn bench_config() -> VisitConfig {
    VisitConfig {
        queue_capacity: 1 << 20,
        workers: 1,
        batch_size: 1024,
        shutdown_grace_secs: 1,
    }
}

/// 单线程 record 吞吐量
fn bench_record_single_thread(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let recorder = rt.block_on(async { VisitRecorder::start(Arc::new(NoopSink), &bench_config()) });

    c.bench_function("record/single_thread", |b| {
        b.iter(|| {
            recorder.record(bench_visit("hot-link"));
        });
    });
}

/// 多任务并发 record 吞吐量
fn bench_concurrent_record(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("record/concurrent");

    for num_tasks in [2, 4, 8] {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::new("tasks", num_tasks),
            &num_tasks,
            |b, &num_tasks| {
                b.to_async(&rt).iter(|| async {
                    let recorder =
                        Arc::new(VisitRecorder::start(Arc::new(NoopSink), &bench_config()));
                    let mut handles = vec![];

                    for _ in 0..num_tasks {
                        let recorder = Arc::clone(&recorder);
                        handles.push(tokio::spawn(async move {
                            for _ in 0..1000 / num_tasks {
                                recorder.record(bench_visit("hot-link"));
                            }
                        }));
                    }

                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_record_single_thread, bench_concurrent_record);
criterion_main!(benches);
