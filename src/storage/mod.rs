use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStore;
pub use models::{
    BrandingConfig, DEFAULT_SCOPE, Link, LinkPreview, LinkSnapshot, SplashPage, TemplateType,
    TwitterCardType, Visit,
};

/// Splash 页 upsert 字段（id / 时间戳由存储层维护）
#[derive(Debug, Clone, Default)]
pub struct SplashPageFields {
    pub template_type: TemplateType,
    pub custom_html: Option<String>,
    pub custom_css: Option<String>,
    pub branding: Option<BrandingConfig>,
    pub is_active: bool,
}

/// 预览 upsert 字段
#[derive(Debug, Clone, Default)]
pub struct PreviewFields {
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image_url: Option<String>,
    pub twitter_card_type: TwitterCardType,
    pub custom_preview_config: Option<serde_json::Value>,
    pub auto_generated: bool,
}

/// 持久存储接口
///
/// 所有读写都可能以 Database* 错误失败；调用方负责把失败折算为
/// 对外语义（解析路径 fail closed，访问记录路径 best effort）。
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn find_link(&self, scope: &str, code: &str) -> Result<Option<Link>>;
    async fn find_link_by_id(&self, link_id: &str) -> Result<Option<Link>>;
    async fn find_splash_page(&self, link_id: &str) -> Result<Option<SplashPage>>;
    async fn find_preview(&self, link_id: &str) -> Result<Option<LinkPreview>>;

    async fn upsert_link(&self, link: Link) -> Result<()>;
    /// 两步级联：先删 splash/preview 子记录，再删链接本身
    async fn delete_link(&self, link_id: &str) -> Result<()>;
    async fn set_link_flags(
        &self,
        link_id: &str,
        banned: Option<bool>,
        active: Option<bool>,
    ) -> Result<()>;

    async fn upsert_splash_page(&self, link_id: &str, fields: SplashPageFields)
    -> Result<SplashPage>;
    async fn delete_splash_page(&self, link_id: &str) -> Result<()>;
    async fn upsert_preview(&self, link_id: &str, fields: PreviewFields) -> Result<LinkPreview>;
    async fn delete_preview(&self, link_id: &str) -> Result<()>;

    /// 批量累加 visit_count，updates 为 (link_id, 增量)
    async fn increment_visit_counts(&self, updates: Vec<(String, usize)>) -> Result<()>;
    async fn insert_visits(&self, visits: Vec<Visit>) -> Result<()>;

    /// 组装解析快照：链接 + 生效的 splash 页
    ///
    /// splash 只在父链接存在且打了 has_splash_page 标记时才读取，
    /// 孤儿 splash 行因此不可达。
    async fn load_snapshot(&self, scope: &str, code: &str) -> Result<Option<LinkSnapshot>> {
        let Some(link) = self.find_link(scope, code).await? else {
            return Ok(None);
        };

        let splash = if link.has_splash_page {
            self.find_splash_page(&link.id)
                .await?
                .filter(|s| s.is_active)
        } else {
            None
        };

        Ok(Some(LinkSnapshot::new(link, splash)))
    }
}

pub struct StoreFactory;

impl StoreFactory {
    pub async fn create() -> Result<Arc<SeaOrmStore>> {
        let config = crate::config::get_config();
        let store = SeaOrmStore::new(&config.database).await?;
        Ok(Arc::new(store))
    }
}
