//! 链接写路径服务
//!
//! 外部 CRUD 协作方的唯一入口：校验、哈希、落库，并在返回成功前
//! 同步清掉受影响短码的缓存。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::cache::SnapshotCache;
use crate::errors::{LinkgateError, Result};
use crate::storage::{Link, LinkStore};
use crate::utils::password::{process_new_password, process_update_password};
use crate::utils::url_validator::validate_url;
use crate::utils::{generate_random_code, is_valid_short_code};

/// 随机短码长度
const RANDOM_CODE_LEN: usize = 7;

/// 创建请求
#[derive(Debug, Clone, Default)]
pub struct LinkCreate {
    pub scope: String,
    /// None 时生成随机短码
    pub code: Option<String>,
    pub target: String,
    pub owner_id: Option<String>,
    /// 明文密码，存储前哈希；None 表示无密码
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 更新请求；None 字段保持原值
#[derive(Debug, Clone, Default)]
pub struct LinkUpdate {
    pub target: Option<String>,
    /// None 保留原密码，空字符串移除密码
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub clear_expiry: bool,
    pub is_active: Option<bool>,
}

pub struct LinkService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn SnapshotCache>,
}

impl LinkService {
    pub fn new(store: Arc<dyn LinkStore>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { store, cache }
    }

    pub async fn create_link(&self, req: LinkCreate) -> Result<Link> {
        validate_url(&req.target).map_err(|e| LinkgateError::validation(e.to_string()))?;

        let code = match req.code {
            Some(code) => {
                if !is_valid_short_code(&code) {
                    return Err(LinkgateError::validation(format!("非法短码: {}", code)));
                }
                if self.store.find_link(&req.scope, &code).await?.is_some() {
                    return Err(LinkgateError::validation(format!("短码已存在: {}", code)));
                }
                code
            }
            None => self.pick_free_code(&req.scope).await?,
        };

        let password_hash = process_new_password(req.password.as_deref())
            .map_err(|e| LinkgateError::validation(e.to_string()))?;

        let now = Utc::now();
        let link = Link {
            id: Uuid::new_v4().to_string(),
            scope: req.scope,
            code,
            target: req.target,
            owner_id: req.owner_id,
            password_hash,
            expires_at: req.expires_at,
            banned: false,
            is_active: true,
            visit_count: 0,
            has_splash_page: false,
            has_custom_preview: false,
            created_at: now,
            updated_at: now,
        };

        self.store.upsert_link(link.clone()).await?;
        self.cache.remove(&link.scope, &link.code).await;

        info!("Link created: {}:{}", link.scope, link.code);
        Ok(link)
    }

    pub async fn update_link(&self, link_id: &str, req: LinkUpdate) -> Result<Link> {
        let mut link = self.require_link(link_id).await?;

        if let Some(target) = req.target {
            validate_url(&target).map_err(|e| LinkgateError::validation(e.to_string()))?;
            link.target = target;
        }
        link.password_hash =
            process_update_password(req.password.as_deref(), link.password_hash.take())
                .map_err(|e| LinkgateError::validation(e.to_string()))?;
        if req.clear_expiry {
            link.expires_at = None;
        } else if let Some(expires_at) = req.expires_at {
            link.expires_at = Some(expires_at);
        }
        if let Some(is_active) = req.is_active {
            link.is_active = is_active;
        }
        link.updated_at = Utc::now();

        self.store.upsert_link(link.clone()).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(link)
    }

    /// 物理删除：存储层级联删除子记录，随后清缓存
    pub async fn delete_link(&self, link_id: &str) -> Result<()> {
        let link = self.require_link(link_id).await?;

        self.store.delete_link(link_id).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(())
    }

    /// 管控封禁 / 解封
    pub async fn set_banned(&self, link_id: &str, banned: bool) -> Result<()> {
        let link = self.require_link(link_id).await?;

        self.store.set_link_flags(link_id, Some(banned), None).await?;
        self.cache.remove(&link.scope, &link.code).await;

        info!("Link {}: banned={}", link.code, banned);
        Ok(())
    }

    /// 属主启用 / 停用
    pub async fn set_active(&self, link_id: &str, is_active: bool) -> Result<()> {
        let link = self.require_link(link_id).await?;

        self.store
            .set_link_flags(link_id, None, Some(is_active))
            .await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(())
    }

    /// 批量封禁（管控动作），结束后整体失效缓存
    pub async fn ban_links(&self, link_ids: &[String]) -> Result<usize> {
        let mut banned = 0;
        for link_id in link_ids {
            match self.store.set_link_flags(link_id, Some(true), None).await {
                Ok(()) => banned += 1,
                Err(LinkgateError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        self.cache.invalidate_all().await;
        info!("Bulk ban: {}/{} links banned", banned, link_ids.len());
        Ok(banned)
    }

    async fn require_link(&self, link_id: &str) -> Result<Link> {
        self.store
            .find_link_by_id(link_id)
            .await?
            .ok_or_else(|| LinkgateError::not_found(format!("链接不存在: {}", link_id)))
    }

    async fn pick_free_code(&self, scope: &str) -> Result<String> {
        // 随机码碰撞概率极低，重试几次足够
        for _ in 0..5 {
            let code = generate_random_code(RANDOM_CODE_LEN);
            if self.store.find_link(scope, &code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(LinkgateError::validation(
            "无法生成可用短码，请重试".to_string(),
        ))
    }
}
