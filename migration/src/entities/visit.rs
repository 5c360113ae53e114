//! Visit fact entity, one row per allowed redirect

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "visits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub link_id: String,
    pub visited_at: DateTimeUtc,
    /// 来源分类（direct / search:xx / social:xx / ref:domain）
    pub referrer_class: Option<String>,
    pub device_class: Option<String>,
    pub browser_class: Option<String>,
    /// ISO 3166-1 alpha-2
    pub country: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
