//! Splash 页与社交预览写路径服务
//!
//! 管理端 CRUD 的透传层：校验后写入存储（存储层维护父链接标记），
//! 返回成功前同步清掉对应短码的缓存。

use std::sync::Arc;

use crate::cache::SnapshotCache;
use crate::errors::{LinkgateError, Result};
use crate::storage::{Link, LinkPreview, LinkStore, PreviewFields, SplashPage, SplashPageFields};
use crate::utils::url_validator::validate_url;

/// og_title 长度上限
const OG_TITLE_MAX: usize = 200;
/// og_image_url 长度上限
const OG_IMAGE_URL_MAX: usize = 500;

pub struct PageService {
    store: Arc<dyn LinkStore>,
    cache: Arc<dyn SnapshotCache>,
}

impl PageService {
    pub fn new(store: Arc<dyn LinkStore>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { store, cache }
    }

    pub async fn get_splash_page(&self, link_id: &str) -> Result<Option<SplashPage>> {
        self.require_link(link_id).await?;
        self.store.find_splash_page(link_id).await
    }

    pub async fn upsert_splash_page(
        &self,
        link_id: &str,
        fields: SplashPageFields,
    ) -> Result<SplashPage> {
        let link = self.require_link(link_id).await?;

        let splash = self.store.upsert_splash_page(link_id, fields).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(splash)
    }

    pub async fn delete_splash_page(&self, link_id: &str) -> Result<()> {
        let link = self.require_link(link_id).await?;

        self.store.delete_splash_page(link_id).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(())
    }

    pub async fn get_preview(&self, link_id: &str) -> Result<Option<LinkPreview>> {
        self.require_link(link_id).await?;
        self.store.find_preview(link_id).await
    }

    pub async fn upsert_preview(
        &self,
        link_id: &str,
        fields: PreviewFields,
    ) -> Result<LinkPreview> {
        let link = self.require_link(link_id).await?;

        if let Some(title) = &fields.og_title
            && title.chars().count() > OG_TITLE_MAX
        {
            return Err(LinkgateError::validation(format!(
                "og_title 超出 {} 字符上限",
                OG_TITLE_MAX
            )));
        }
        if let Some(image_url) = &fields.og_image_url {
            if image_url.len() > OG_IMAGE_URL_MAX {
                return Err(LinkgateError::validation(format!(
                    "og_image_url 超出 {} 字符上限",
                    OG_IMAGE_URL_MAX
                )));
            }
            validate_url(image_url).map_err(|e| LinkgateError::validation(e.to_string()))?;
        }

        let preview = self.store.upsert_preview(link_id, fields).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(preview)
    }

    pub async fn delete_preview(&self, link_id: &str) -> Result<()> {
        let link = self.require_link(link_id).await?;

        self.store.delete_preview(link_id).await?;
        self.cache.remove(&link.scope, &link.code).await;

        Ok(())
    }

    async fn require_link(&self, link_id: &str) -> Result<Link> {
        self.store
            .find_link_by_id(link_id)
            .await?
            .ok_or_else(|| LinkgateError::not_found(format!("链接不存在: {}", link_id)))
    }
}
