//! Write operations for SeaOrmStore
//!
//! 所有写操作完成后由服务层同步清掉对应短码的缓存。

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use super::converters::{
    link_to_active_model, preview_fields_to_active_model, splash_fields_to_active_model,
};
use super::{SeaOrmStore, retry};
use crate::errors::{LinkgateError, Result};
use crate::storage::models::{Link, LinkPreview, SplashPage};
use crate::storage::{PreviewFields, SplashPageFields};

use migration::entities::{link, link_preview, splash_page};

impl SeaOrmStore {
    pub async fn upsert_link(&self, link_record: Link) -> Result<()> {
        let db = &self.db;
        let model = link_to_active_model(&link_record);

        retry::with_retry(
            &format!("upsert_link({})", link_record.code),
            self.write_retry,
            || async {
                link::Entity::insert(model.clone())
                    .on_conflict(
                        OnConflict::column(link::Column::Id)
                            .update_columns([
                                link::Column::Scope,
                                link::Column::ShortCode,
                                link::Column::TargetUrl,
                                link::Column::OwnerId,
                                link::Column::Password,
                                link::Column::ExpiresAt,
                                link::Column::Banned,
                                link::Column::IsActive,
                                link::Column::HasSplashPage,
                                link::Column::HasCustomPreview,
                                link::Column::UpdatedAt,
                            ])
                            .to_owned(),
                    )
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| LinkgateError::database_operation(format!("写入链接失败: {}", e)))?;

        Ok(())
    }

    /// 两步级联删除：先删 splash/preview 子记录，再删链接本身。
    /// 两张表之间不假设原子性；残留的孤儿子记录不会被读到。
    pub async fn delete_link(&self, link_id: &str) -> Result<()> {
        let db = &self.db;

        splash_page::Entity::delete_many()
            .filter(splash_page::Column::LinkId.eq(link_id))
            .exec(db)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("删除 splash 页失败: {}", e)))?;

        link_preview::Entity::delete_many()
            .filter(link_preview::Column::LinkId.eq(link_id))
            .exec(db)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("删除预览失败: {}", e)))?;

        let result = link::Entity::delete_by_id(link_id)
            .exec(db)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("删除链接失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(LinkgateError::not_found(format!("链接不存在: {}", link_id)));
        }

        info!("Link deleted: {}", link_id);
        Ok(())
    }

    /// 更新封禁 / 启用标记，同时推进 updated_at 使快照版本失效
    pub async fn set_link_flags(
        &self,
        link_id: &str,
        banned: Option<bool>,
        active: Option<bool>,
    ) -> Result<()> {
        if banned.is_none() && active.is_none() {
            return Ok(());
        }

        let mut update = link::Entity::update_many().filter(link::Column::Id.eq(link_id));

        if let Some(banned) = banned {
            update = update.col_expr(link::Column::Banned, Expr::value(banned));
        }
        if let Some(active) = active {
            update = update.col_expr(link::Column::IsActive, Expr::value(active));
        }
        update = update.col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()));

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("更新链接标记失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(LinkgateError::not_found(format!("链接不存在: {}", link_id)));
        }

        Ok(())
    }

    pub async fn upsert_splash_page(
        &self,
        link_id: &str,
        fields: SplashPageFields,
    ) -> Result<SplashPage> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("开始事务失败: {}", e)))?;

        if link::Entity::find_by_id(link_id)
            .one(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("查询链接失败: {}", e)))?
            .is_none()
        {
            return Err(LinkgateError::not_found(format!("链接不存在: {}", link_id)));
        }

        let existing = splash_page::Entity::find()
            .filter(splash_page::Column::LinkId.eq(link_id))
            .one(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("查询 splash 页失败: {}", e)))?;

        let now = Utc::now();
        let (id, created_at, is_update) = match &existing {
            Some(model) => (model.id.clone(), model.created_at, true),
            None => (Uuid::new_v4().to_string(), now, false),
        };

        let model = splash_fields_to_active_model(id.clone(), link_id, &fields, created_at, now);
        if is_update {
            splash_page::Entity::update(model)
                .exec(&txn)
                .await
                .map_err(|e| {
                    LinkgateError::database_operation(format!("更新 splash 页失败: {}", e))
                })?;
        } else {
            splash_page::Entity::insert(model)
                .exec(&txn)
                .await
                .map_err(|e| {
                    LinkgateError::database_operation(format!("写入 splash 页失败: {}", e))
                })?;
        }

        // 父链接标记跟随 is_active，并推进版本
        link::Entity::update_many()
            .filter(link::Column::Id.eq(link_id))
            .col_expr(link::Column::HasSplashPage, Expr::value(fields.is_active))
            .col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("更新链接标记失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("提交事务失败: {}", e)))?;

        Ok(SplashPage {
            id,
            link_id: link_id.to_string(),
            template_type: fields.template_type,
            custom_html: fields.custom_html,
            custom_css: fields.custom_css,
            branding: fields.branding,
            is_active: fields.is_active,
            created_at,
            updated_at: now,
        })
    }

    pub async fn delete_splash_page(&self, link_id: &str) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("开始事务失败: {}", e)))?;

        splash_page::Entity::delete_many()
            .filter(splash_page::Column::LinkId.eq(link_id))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("删除 splash 页失败: {}", e)))?;

        link::Entity::update_many()
            .filter(link::Column::Id.eq(link_id))
            .col_expr(link::Column::HasSplashPage, Expr::value(false))
            .col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("更新链接标记失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("提交事务失败: {}", e)))?;

        Ok(())
    }

    pub async fn upsert_preview(
        &self,
        link_id: &str,
        fields: PreviewFields,
    ) -> Result<LinkPreview> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("开始事务失败: {}", e)))?;

        if link::Entity::find_by_id(link_id)
            .one(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("查询链接失败: {}", e)))?
            .is_none()
        {
            return Err(LinkgateError::not_found(format!("链接不存在: {}", link_id)));
        }

        let existing = link_preview::Entity::find()
            .filter(link_preview::Column::LinkId.eq(link_id))
            .one(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("查询预览失败: {}", e)))?;

        let now = Utc::now();
        let (id, created_at, is_update) = match &existing {
            Some(model) => (model.id.clone(), model.created_at, true),
            None => (Uuid::new_v4().to_string(), now, false),
        };

        let model = preview_fields_to_active_model(id.clone(), link_id, &fields, created_at, now);
        if is_update {
            link_preview::Entity::update(model)
                .exec(&txn)
                .await
                .map_err(|e| LinkgateError::database_operation(format!("更新预览失败: {}", e)))?;
        } else {
            link_preview::Entity::insert(model)
                .exec(&txn)
                .await
                .map_err(|e| LinkgateError::database_operation(format!("写入预览失败: {}", e)))?;
        }

        link::Entity::update_many()
            .filter(link::Column::Id.eq(link_id))
            .col_expr(link::Column::HasCustomPreview, Expr::value(true))
            .col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("更新链接标记失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("提交事务失败: {}", e)))?;

        Ok(LinkPreview {
            id,
            link_id: link_id.to_string(),
            og_title: fields.og_title,
            og_description: fields.og_description,
            og_image_url: fields.og_image_url,
            twitter_card_type: fields.twitter_card_type,
            custom_preview_config: fields.custom_preview_config,
            auto_generated: fields.auto_generated,
            created_at,
            updated_at: now,
        })
    }

    pub async fn delete_preview(&self, link_id: &str) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("开始事务失败: {}", e)))?;

        link_preview::Entity::delete_many()
            .filter(link_preview::Column::LinkId.eq(link_id))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("删除预览失败: {}", e)))?;

        link::Entity::update_many()
            .filter(link::Column::Id.eq(link_id))
            .col_expr(link::Column::HasCustomPreview, Expr::value(false))
            .col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&txn)
            .await
            .map_err(|e| LinkgateError::database_operation(format!("更新链接标记失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| LinkgateError::database_operation(format!("提交事务失败: {}", e)))?;

        Ok(())
    }
}
