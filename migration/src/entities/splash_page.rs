use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "link_splash_pages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub link_id: String,
    pub template_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_html: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_css: Option<String>,
    /// 序列化后的品牌配置（标题、描述、颜色、自动跳转）
    #[sea_orm(column_type = "Text", nullable)]
    pub branding_config: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
