//! SeaORM storage backend
//!
//! 支持 SQLite、MySQL/MariaDB、PostgreSQL 三种后端。

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod visit_sink;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::storage::models::{Link, LinkPreview, SplashPage, Visit};
use crate::storage::{LinkStore, PreviewFields, SplashPageFields};

pub use connection::{connect_generic, connect_sqlite, infer_backend_from_url, run_migrations};

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    backend_name: String,
    /// 读路径重试：带单次尝试超时，超时视为存储故障
    read_retry: retry::RetryConfig,
    /// 写路径重试：不限时
    write_retry: retry::RetryConfig,
}

impl SeaOrmStore {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let backend_name = infer_backend_from_url(&config.database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(&config.database_url).await?
        } else {
            connect_generic(config, &backend_name).await?
        };

        let write_retry = retry::RetryConfig {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
            attempt_timeout_ms: None,
        };
        let read_retry = retry::RetryConfig {
            attempt_timeout_ms: Some(config.op_timeout_ms),
            ..write_retry
        };

        let store = SeaOrmStore {
            db,
            backend_name,
            read_retry,
            write_retry,
        };

        run_migrations(&store.db).await?;

        info!("{} store initialized", store.backend_name.to_uppercase());
        Ok(store)
    }

    /// 测试和迁移工具需要直接访问连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

#[async_trait]
impl LinkStore for SeaOrmStore {
    async fn find_link(&self, scope: &str, code: &str) -> Result<Option<Link>> {
        SeaOrmStore::find_link(self, scope, code).await
    }

    async fn find_link_by_id(&self, link_id: &str) -> Result<Option<Link>> {
        SeaOrmStore::find_link_by_id(self, link_id).await
    }

    async fn find_splash_page(&self, link_id: &str) -> Result<Option<SplashPage>> {
        SeaOrmStore::find_splash_page(self, link_id).await
    }

    async fn find_preview(&self, link_id: &str) -> Result<Option<LinkPreview>> {
        SeaOrmStore::find_preview(self, link_id).await
    }

    async fn upsert_link(&self, link: Link) -> Result<()> {
        SeaOrmStore::upsert_link(self, link).await
    }

    async fn delete_link(&self, link_id: &str) -> Result<()> {
        SeaOrmStore::delete_link(self, link_id).await
    }

    async fn set_link_flags(
        &self,
        link_id: &str,
        banned: Option<bool>,
        active: Option<bool>,
    ) -> Result<()> {
        SeaOrmStore::set_link_flags(self, link_id, banned, active).await
    }

    async fn upsert_splash_page(
        &self,
        link_id: &str,
        fields: SplashPageFields,
    ) -> Result<SplashPage> {
        SeaOrmStore::upsert_splash_page(self, link_id, fields).await
    }

    async fn delete_splash_page(&self, link_id: &str) -> Result<()> {
        SeaOrmStore::delete_splash_page(self, link_id).await
    }

    async fn upsert_preview(&self, link_id: &str, fields: PreviewFields) -> Result<LinkPreview> {
        SeaOrmStore::upsert_preview(self, link_id, fields).await
    }

    async fn delete_preview(&self, link_id: &str) -> Result<()> {
        SeaOrmStore::delete_preview(self, link_id).await
    }

    async fn increment_visit_counts(&self, updates: Vec<(String, usize)>) -> Result<()> {
        SeaOrmStore::increment_visit_counts(self, updates).await
    }

    async fn insert_visits(&self, visits: Vec<Visit>) -> Result<()> {
        SeaOrmStore::insert_visits(self, visits).await
    }
}
