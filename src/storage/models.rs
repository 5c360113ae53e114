use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// 默认域命名空间（空字符串），自定义域用域名本身
pub const DEFAULT_SCOPE: &str = "";

/// 链接记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub scope: String,
    pub code: String,
    pub target: String,
    pub owner_id: Option<String>,
    /// Argon2id PHC 格式哈希，绝不存明文
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub banned: bool,
    pub is_active: bool,
    pub visit_count: i64,
    pub has_splash_page: bool,
    pub has_custom_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// 过期判定，边界含等于
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Splash 页模板类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Minimal,
    Promotional,
    Warning,
    Branded,
}

/// Twitter 卡片类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TwitterCardType {
    #[default]
    Summary,
    SummaryLargeImage,
    App,
    Player,
}

/// Splash 页品牌配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub auto_redirect: bool,
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay_secs: u32,
}

fn default_redirect_delay() -> u32 {
    5
}

/// 链接的插页配置（每个链接最多一条）
///
/// custom_html / custom_css 是属主提交的非可信内容，只存储转发，
/// 服务端绝不执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplashPage {
    pub id: String,
    pub link_id: String,
    pub template_type: TemplateType,
    pub custom_html: Option<String>,
    pub custom_css: Option<String>,
    pub branding: Option<BrandingConfig>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 链接的社交预览配置（每个链接最多一条）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkPreview {
    pub id: String,
    pub link_id: String,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image_url: Option<String>,
    pub twitter_card_type: TwitterCardType,
    pub custom_preview_config: Option<serde_json::Value>,
    pub auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 访问事实记录，追加写入
#[derive(Debug, Clone)]
pub struct Visit {
    pub link_id: String,
    pub visited_at: DateTime<Utc>,
    pub referrer_class: Option<String>,
    pub device_class: Option<String>,
    pub browser_class: Option<String>,
    pub country: Option<String>,
}

/// 解析快照：Link + 生效的 SplashPage 的不可变读模型
#[derive(Debug, Clone)]
pub struct LinkSnapshot {
    pub link: Link,
    pub splash: Option<SplashPage>,
    pub fetched_at: DateTime<Utc>,
    /// 来自 updated_at 的版本号，失效检查用
    pub version: i64,
}

impl LinkSnapshot {
    pub fn new(link: Link, splash: Option<SplashPage>) -> Self {
        let version = link.updated_at.timestamp_millis();
        Self {
            link,
            splash,
            fetched_at: Utc::now(),
            version,
        }
    }
}
