//! Read-only operations for SeaOrmStore
//!
//! 读操作带重试与单次尝试超时；错误向上传播，由解析层 fail closed。

use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter};

use super::{SeaOrmStore, retry};
use crate::errors::{LinkgateError, Result};
use crate::storage::models::{Link, LinkPreview, SplashPage};

use migration::entities::{link, link_preview, splash_page};

use super::converters::{model_to_link, model_to_preview, model_to_splash_page};

/// 读路径错误映射：超时归入 StoreTimeout，其余为一般数据库故障
fn map_read_err(context: &str, e: DbErr) -> LinkgateError {
    match &e {
        DbErr::Custom(msg) if msg.contains("timed out") => {
            LinkgateError::store_timeout(format!("{}: {}", context, e))
        }
        _ => LinkgateError::database_operation(format!("{}: {}", context, e)),
    }
}

impl SeaOrmStore {
    pub async fn find_link(&self, scope: &str, code: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("find_link({})", code), self.read_retry, || async {
            link::Entity::find()
                .filter(link::Column::Scope.eq(scope))
                .filter(link::Column::ShortCode.eq(code))
                .one(db)
                .await
        })
        .await
        .map_err(|e| map_read_err("查询链接失败", e))?;

        Ok(model.map(model_to_link))
    }

    pub async fn find_link_by_id(&self, link_id: &str) -> Result<Option<Link>> {
        let db = &self.db;
        let id = link_id.to_string();

        let model = retry::with_retry(
            &format!("find_link_by_id({})", link_id),
            self.read_retry,
            || async { link::Entity::find_by_id(&id).one(db).await },
        )
        .await
        .map_err(|e| map_read_err("查询链接失败", e))?;

        Ok(model.map(model_to_link))
    }

    pub async fn find_splash_page(&self, link_id: &str) -> Result<Option<SplashPage>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_splash_page({})", link_id),
            self.read_retry,
            || async {
                splash_page::Entity::find()
                    .filter(splash_page::Column::LinkId.eq(link_id))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| map_read_err("查询 splash 页失败", e))?;

        Ok(model.map(model_to_splash_page))
    }

    pub async fn find_preview(&self, link_id: &str) -> Result<Option<LinkPreview>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_preview({})", link_id),
            self.read_retry,
            || async {
                link_preview::Entity::find()
                    .filter(link_preview::Column::LinkId.eq(link_id))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| map_read_err("查询预览失败", e))?;

        Ok(model.map(model_to_preview))
    }
}
