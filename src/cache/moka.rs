use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::cache::{CacheResult, SnapshotCache, snapshot_key};
use crate::config::CacheConfig;
use crate::storage::LinkSnapshot;

/// 按 expires_at 计算快照的缓存存活时间
struct SnapshotExpiry {
    default_ttl: Duration,
    /// 已过期链接的短暂驻留，命中由策略层拒绝，避免热点过期码打穿存储
    expired_ttl: Duration,
}

impl Expiry<String, LinkSnapshot> for SnapshotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LinkSnapshot,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value.link.expires_at {
            Some(expires_at) => {
                let now = chrono::Utc::now();
                if expires_at <= now {
                    Some(self.expired_ttl)
                } else {
                    let remaining = (expires_at - now).num_seconds().max(1) as u64;
                    Some(Duration::from_secs(
                        remaining.min(self.default_ttl.as_secs()),
                    ))
                }
            }
            None => Some(self.default_ttl),
        }
    }
}

/// moka 实现：正缓存（快照）+ 负缓存（确定不存在的短码）
pub struct MokaSnapshotCache {
    positive: Cache<String, LinkSnapshot>,
    negative: Cache<String, ()>,
}

impl MokaSnapshotCache {
    pub fn new(config: &CacheConfig) -> Self {
        let default_ttl = Duration::from_secs(config.default_ttl_secs);

        let positive = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(SnapshotExpiry {
                default_ttl,
                expired_ttl: Duration::from_secs(config.negative_ttl_secs),
            })
            .build();

        let negative = Cache::builder()
            .max_capacity(config.negative_capacity)
            .time_to_live(Duration::from_secs(config.negative_ttl_secs))
            .build();

        debug!(
            "MokaSnapshotCache initialized: capacity={}, ttl={}s, negative_ttl={}s",
            config.max_capacity, config.default_ttl_secs, config.negative_ttl_secs
        );

        Self { positive, negative }
    }

    #[cfg(test)]
    async fn run_pending_tasks(&self) {
        self.positive.run_pending_tasks().await;
        self.negative.run_pending_tasks().await;
    }
}

#[async_trait]
impl SnapshotCache for MokaSnapshotCache {
    async fn get(&self, scope: &str, code: &str) -> CacheResult {
        let key = snapshot_key(scope, code);

        if self.negative.contains_key(&key) {
            trace!("Negative cache hit: {}", key);
            return CacheResult::NotFound;
        }

        match self.positive.get(&key).await {
            Some(snapshot) => CacheResult::Found(snapshot),
            None => CacheResult::Miss,
        }
    }

    async fn insert(&self, scope: &str, code: &str, snapshot: LinkSnapshot) {
        let key = snapshot_key(scope, code);
        // 短码重新出现时清掉负缓存标记
        self.negative.invalidate(&key).await;
        self.positive.insert(key, snapshot).await;
    }

    async fn mark_not_found(&self, scope: &str, code: &str) {
        let key = snapshot_key(scope, code);
        self.positive.invalidate(&key).await;
        self.negative.insert(key, ()).await;
    }

    async fn remove(&self, scope: &str, code: &str) {
        let key = snapshot_key(scope, code);
        self.positive.invalidate(&key).await;
        self.negative.invalidate(&key).await;
    }

    async fn invalidate_all(&self) {
        self.positive.invalidate_all();
        self.negative.invalidate_all();
    }
}
