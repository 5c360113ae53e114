use crate::storage::Visit;

/// 访问记录落库端
///
/// 一次调用落一批：插入 Visit 行 + 按 link_id 聚合后的计数累加。
/// 实现方负责自己的重试；返回 Err 表示这批最终失败。
#[async_trait::async_trait]
pub trait VisitSink: Send + Sync {
    async fn flush_visits(
        &self,
        visits: Vec<Visit>,
        counts: Vec<(String, usize)>,
    ) -> anyhow::Result<()>;
}

pub struct StdoutSink;

#[async_trait::async_trait]
impl VisitSink for StdoutSink {
    async fn flush_visits(
        &self,
        visits: Vec<Visit>,
        counts: Vec<(String, usize)>,
    ) -> anyhow::Result<()> {
        println!("Flushing {} visits, counts: {:?}", visits.len(), counts);
        Ok(())
    }
}
