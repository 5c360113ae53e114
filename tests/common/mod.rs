//! 测试共享的内存版存储与 sink
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use linkgate::analytics::VisitSink;
use linkgate::errors::{LinkgateError, Result};
use linkgate::storage::{
    DEFAULT_SCOPE, Link, LinkPreview, LinkStore, PreviewFields, SplashPage, SplashPageFields,
    Visit,
};

pub fn make_link(code: &str, target: &str) -> Link {
    let now = Utc::now();
    Link {
        id: Uuid::new_v4().to_string(),
        scope: DEFAULT_SCOPE.to_string(),
        code: code.to_string(),
        target: target.to_string(),
        owner_id: None,
        password_hash: None,
        expires_at: None,
        banned: false,
        is_active: true,
        visit_count: 0,
        has_splash_page: false,
        has_custom_preview: false,
        created_at: now,
        updated_at: now,
    }
}

/// 内存实现：带读取计数、可注入延迟与故障
#[derive(Default)]
pub struct MockStore {
    links: Mutex<HashMap<String, Link>>,
    splashes: Mutex<HashMap<String, SplashPage>>,
    previews: Mutex<HashMap<String, LinkPreview>>,
    pub find_link_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    read_delay_ms: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(self, link: Link) -> Self {
        self.links.lock().unwrap().insert(link.id.clone(), link);
        self
    }

    pub fn insert_link(&self, link: Link) {
        self.links.lock().unwrap().insert(link.id.clone(), link);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn link_by_code(&self, scope: &str, code: &str) -> Option<Link> {
        self.links
            .lock()
            .unwrap()
            .values()
            .find(|l| l.scope == scope && l.code == code)
            .cloned()
    }

    async fn simulate_read(&self) -> Result<()> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LinkgateError::database_connection("mock store down"));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MockStore {
    async fn find_link(&self, scope: &str, code: &str) -> Result<Option<Link>> {
        self.find_link_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_read().await?;
        Ok(self.link_by_code(scope, code))
    }

    async fn find_link_by_id(&self, link_id: &str) -> Result<Option<Link>> {
        self.simulate_read().await?;
        Ok(self.links.lock().unwrap().get(link_id).cloned())
    }

    async fn find_splash_page(&self, link_id: &str) -> Result<Option<SplashPage>> {
        self.simulate_read().await?;
        Ok(self.splashes.lock().unwrap().get(link_id).cloned())
    }

    async fn find_preview(&self, link_id: &str) -> Result<Option<LinkPreview>> {
        self.simulate_read().await?;
        Ok(self.previews.lock().unwrap().get(link_id).cloned())
    }

    async fn upsert_link(&self, link: Link) -> Result<()> {
        self.links.lock().unwrap().insert(link.id.clone(), link);
        Ok(())
    }

    async fn delete_link(&self, link_id: &str) -> Result<()> {
        self.splashes.lock().unwrap().remove(link_id);
        self.previews.lock().unwrap().remove(link_id);
        self.links
            .lock()
            .unwrap()
            .remove(link_id)
            .map(|_| ())
            .ok_or_else(|| LinkgateError::not_found(format!("链接不存在: {}", link_id)))
    }

    async fn set_link_flags(
        &self,
        link_id: &str,
        banned: Option<bool>,
        active: Option<bool>,
    ) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        let link = links
            .get_mut(link_id)
            .ok_or_else(|| LinkgateError::not_found(format!("链接不存在: {}", link_id)))?;

        if let Some(banned) = banned {
            link.banned = banned;
        }
        if let Some(active) = active {
            link.is_active = active;
        }
        link.updated_at = Utc::now();
        Ok(())
    }

    async fn upsert_splash_page(
        &self,
        link_id: &str,
        fields: SplashPageFields,
    ) -> Result<SplashPage> {
        let now = Utc::now();
        let mut splashes = self.splashes.lock().unwrap();
        let existing = splashes.get(link_id);

        let splash = SplashPage {
            id: existing
                .map(|s| s.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            link_id: link_id.to_string(),
            template_type: fields.template_type,
            custom_html: fields.custom_html,
            custom_css: fields.custom_css,
            branding: fields.branding,
            is_active: fields.is_active,
            created_at: existing.map(|s| s.created_at).unwrap_or(now),
            updated_at: now,
        };
        splashes.insert(link_id.to_string(), splash.clone());

        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.get_mut(link_id) {
            link.has_splash_page = splash.is_active;
            link.updated_at = now;
        }

        Ok(splash)
    }

    async fn delete_splash_page(&self, link_id: &str) -> Result<()> {
        self.splashes.lock().unwrap().remove(link_id);

        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.get_mut(link_id) {
            link.has_splash_page = false;
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn upsert_preview(&self, link_id: &str, fields: PreviewFields) -> Result<LinkPreview> {
        let now = Utc::now();
        let mut previews = self.previews.lock().unwrap();
        let existing = previews.get(link_id);

        let preview = LinkPreview {
            id: existing
                .map(|p| p.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            link_id: link_id.to_string(),
            og_title: fields.og_title,
            og_description: fields.og_description,
            og_image_url: fields.og_image_url,
            twitter_card_type: fields.twitter_card_type,
            custom_preview_config: fields.custom_preview_config,
            auto_generated: fields.auto_generated,
            created_at: existing.map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        };
        previews.insert(link_id.to_string(), preview.clone());

        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.get_mut(link_id) {
            link.has_custom_preview = true;
            link.updated_at = now;
        }

        Ok(preview)
    }

    async fn delete_preview(&self, link_id: &str) -> Result<()> {
        self.previews.lock().unwrap().remove(link_id);

        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.get_mut(link_id) {
            link.has_custom_preview = false;
            link.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_visit_counts(&self, updates: Vec<(String, usize)>) -> Result<()> {
        let mut links = self.links.lock().unwrap();
        for (link_id, n) in updates {
            if let Some(link) = links.get_mut(&link_id) {
                link.visit_count += n as i64;
            }
        }
        Ok(())
    }

    async fn insert_visits(&self, _visits: Vec<Visit>) -> Result<()> {
        Ok(())
    }
}

/// 捕获型 sink
#[derive(Default)]
pub struct CapturingSink {
    pub visits: Mutex<Vec<Visit>>,
}

#[async_trait]
impl VisitSink for CapturingSink {
    async fn flush_visits(&self, visits: Vec<Visit>, _counts: Vec<(String, usize)>) -> anyhow::Result<()> {
        self.visits.lock().unwrap().extend(visits);
        Ok(())
    }
}

/// 永不返回的 sink，用于堵死队列
pub struct StuckSink;

#[async_trait]
impl VisitSink for StuckSink {
    async fn flush_visits(
        &self,
        _visits: Vec<Visit>,
        _counts: Vec<(String, usize)>,
    ) -> anyhow::Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
