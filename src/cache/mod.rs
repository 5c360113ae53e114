pub mod flight;
pub mod moka;

pub use flight::{Flight, FlightGroup};
pub use moka::MokaSnapshotCache;

use async_trait::async_trait;

use crate::storage::LinkSnapshot;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 确定不存在（负缓存命中）
    NotFound,
    /// 未缓存
    Miss,
    /// 命中快照
    Found(LinkSnapshot),
}

/// 解析缓存：短码 → 快照的有界 TTL 缓存
///
/// 任何对 Link / SplashPage / LinkPreview 的外部写入都必须在返回成功前
/// 同步调用 `remove(scope, code)`。
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn get(&self, scope: &str, code: &str) -> CacheResult;
    async fn insert(&self, scope: &str, code: &str, snapshot: LinkSnapshot);
    /// 记录确定不存在的短码；绝不会产生正缓存条目
    async fn mark_not_found(&self, scope: &str, code: &str);
    async fn remove(&self, scope: &str, code: &str);
    /// 批量管控动作使用
    async fn invalidate_all(&self);
}

/// 组合缓存键，scope 为域命名空间（默认域为空串）
pub fn snapshot_key(scope: &str, code: &str) -> String {
    format!("{}:{}", scope, code)
}
