//! 解析服务：对外唯一入口
//!
//! 缓存读 → 未命中则 single-flight 回源并填充 → 策略评估 →
//! 放行时异步入队访问记录。存储故障一律 fail closed。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, trace};

use crate::analytics::{VisitRecorder, visit_from_request};
use crate::cache::{CacheResult, Flight, FlightGroup, SnapshotCache, snapshot_key};
use crate::errors::Result;
use crate::services::policy::{self, Outcome, RejectReason, RequestContext};
use crate::storage::{LinkSnapshot, LinkStore};
use crate::utils::is_valid_short_code;

/// 一次回源的共享结果
type LoadResult = Result<Option<LinkSnapshot>>;

pub struct Resolver {
    cache: Arc<dyn SnapshotCache>,
    store: Arc<dyn LinkStore>,
    recorder: Arc<VisitRecorder>,
    flights: FlightGroup<LoadResult>,
}

impl Resolver {
    pub fn new(
        cache: Arc<dyn SnapshotCache>,
        store: Arc<dyn LinkStore>,
        recorder: Arc<VisitRecorder>,
        flight_wait: Duration,
    ) -> Self {
        Self {
            cache,
            store,
            recorder,
            flights: FlightGroup::new(flight_wait),
        }
    }

    /// 解析一个短码并给出响应决定
    pub async fn resolve(&self, scope: &str, code: &str, ctx: &RequestContext) -> Outcome {
        // 非法短码直接拒绝，不进缓存、不查库
        if !is_valid_short_code(code) {
            trace!("Invalid short code rejected: {}", code);
            return Outcome::Rejected(RejectReason::NotFound);
        }

        let snapshot = match self.cache.get(scope, code).await {
            CacheResult::Found(snapshot) => Some(snapshot),
            CacheResult::NotFound => {
                debug!("Negative cache hit: {}:{}", scope, code);
                None
            }
            CacheResult::Miss => match self.load_with_flight(scope, code).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Store failure during resolve of '{}': {}", code, e);
                    return Outcome::Rejected(RejectReason::ServiceUnavailable);
                }
            },
        };

        let outcome = policy::evaluate(snapshot.as_ref(), ctx, Utc::now());

        // 只有放行的跳转才计一次访问；入队失败不影响响应
        if let (Outcome::Redirect(_), Some(snapshot)) = (&outcome, &snapshot) {
            self.recorder.record(visit_from_request(
                &snapshot.link.id,
                ctx.referrer.as_deref(),
                ctx.user_agent.as_deref(),
                ctx.country.as_deref(),
            ));
        }

        outcome
    }

    /// 并发 miss 合并为一次后端读取
    async fn load_with_flight(&self, scope: &str, code: &str) -> LoadResult {
        let key = snapshot_key(scope, code);

        match self.flights.begin(&key) {
            Flight::Leader(leader) => {
                let result = self.fetch_and_fill(scope, code).await;
                // 槽位只覆盖读取本身，评估前就释放
                leader.complete(result.clone());
                result
            }
            Flight::Follower(rx) => match self.flights.wait_for(rx).await {
                Some(result) => result,
                None => {
                    // leader 卡死或被取消：退化为一次不填充缓存的直读
                    debug!("Flight wait expired for '{}', falling back to direct read", key);
                    self.store.load_snapshot(scope, code).await
                }
            },
        }
    }

    async fn fetch_and_fill(&self, scope: &str, code: &str) -> LoadResult {
        match self.store.load_snapshot(scope, code).await? {
            Some(snapshot) => {
                self.cache.insert(scope, code, snapshot.clone()).await;
                Ok(Some(snapshot))
            }
            None => {
                // 确定不存在只做负缓存标记，绝不产生正条目
                self.cache.mark_not_found(scope, code).await;
                Ok(None)
            }
        }
    }
}
