use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// 域名命名空间，空字符串表示默认域
    pub scope: String,
    pub short_code: String,
    #[sea_orm(column_type = "Text")]
    pub target_url: String,
    pub owner_id: Option<String>,
    pub password: Option<String>,
    pub expires_at: Option<DateTimeUtc>,
    pub banned: bool,
    pub is_active: bool,
    pub visit_count: i64,
    pub has_splash_page: bool,
    pub has_custom_preview: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
