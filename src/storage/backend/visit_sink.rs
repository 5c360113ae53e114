//! VisitSink implementation for SeaOrmStore
//!
//! 访问记录批量落库：插入 visits 行 + 单条 CASE WHEN 批量累加
//! visit_count。全部走参数化查询。

use async_trait::async_trait;
use sea_orm::sea_query::{CaseStatement, Expr, Query};
use sea_orm::{ConnectionTrait, EntityTrait, ExprTrait};
use tracing::debug;

use super::{SeaOrmStore, retry};
use crate::analytics::VisitSink;
use crate::errors::{LinkgateError, Result};
use crate::storage::models::Visit;

use super::converters::visit_to_active_model;
use migration::entities::{link, visit};

impl SeaOrmStore {
    /// 批量累加 visit_count，一条 UPDATE 覆盖整批
    pub async fn increment_visit_counts(&self, updates: Vec<(String, usize)>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let total_count = updates.len();

        // CASE WHEN 表达式，跨后端兼容
        let mut case_stmt = CaseStatement::new();
        let mut ids: Vec<String> = Vec::with_capacity(total_count);

        for (link_id, count) in &updates {
            case_stmt = case_stmt.case(
                Expr::col(link::Column::Id).eq(Expr::val(link_id.as_str())),
                Expr::col(link::Column::VisitCount).add(Expr::val(*count as i64)),
            );
            ids.push(link_id.clone());
        }
        // 不匹配的保持原值
        case_stmt = case_stmt.finally(Expr::col(link::Column::VisitCount));

        let stmt = Query::update()
            .table(link::Entity)
            .value(link::Column::VisitCount, case_stmt)
            .and_where(Expr::col(link::Column::Id).is_in(ids))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        retry::with_retry("increment_visit_counts", self.write_retry, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| {
            LinkgateError::database_operation(format!("批量累加 visit_count 失败: {}", e))
        })?;

        debug!(
            "Visit counts flushed to {} database ({} links)",
            self.backend_name.to_uppercase(),
            total_count
        );

        Ok(())
    }

    pub async fn insert_visits(&self, visits: Vec<Visit>) -> Result<()> {
        if visits.is_empty() {
            return Ok(());
        }

        let total_count = visits.len();
        let models: Vec<visit::ActiveModel> = visits.iter().map(visit_to_active_model).collect();

        let db = &self.db;
        retry::with_retry("insert_visits", self.write_retry, || async {
            visit::Entity::insert_many(models.clone()).exec(db).await
        })
        .await
        .map_err(|e| LinkgateError::database_operation(format!("批量插入访问记录失败: {}", e)))?;

        debug!(
            "Visit rows written to {} database ({} records)",
            self.backend_name.to_uppercase(),
            total_count
        );

        Ok(())
    }
}

#[async_trait]
impl VisitSink for SeaOrmStore {
    async fn flush_visits(
        &self,
        visits: Vec<Visit>,
        counts: Vec<(String, usize)>,
    ) -> anyhow::Result<()> {
        self.insert_visits(visits)
            .await
            .map_err(|e| anyhow::anyhow!("insert_visits failed: {}", e))?;

        self.increment_visit_counts(counts)
            .await
            .map_err(|e| anyhow::anyhow!("increment_visit_counts failed: {}", e))?;

        Ok(())
    }
}
