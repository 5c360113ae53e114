use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 links 表
        manager
            .create_table(
                Table::create()
                    .table(Link::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Link::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Link::Scope)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Link::ShortCode).string().not_null())
                    .col(ColumnDef::new(Link::TargetUrl).text().not_null())
                    .col(ColumnDef::new(Link::OwnerId).string().null())
                    .col(ColumnDef::new(Link::Password).string().null())
                    .col(
                        ColumnDef::new(Link::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Link::Banned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Link::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Link::VisitCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::HasSplashPage)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Link::HasCustomPreview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Link::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Link::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // (scope, short_code) 唯一索引：同一域内短码唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_links_scope_code")
                    .table(Link::Table)
                    .col(Link::Scope)
                    .col(Link::ShortCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_expires_at")
                    .table(Link::Table)
                    .col(Link::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // 创建 visits 表
        manager
            .create_table(
                Table::create()
                    .table(Visit::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visit::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Visit::LinkId).string().not_null())
                    .col(
                        ColumnDef::new(Visit::VisitedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Visit::ReferrerClass).string().null())
                    .col(ColumnDef::new(Visit::DeviceClass).string().null())
                    .col(ColumnDef::new(Visit::BrowserClass).string().null())
                    .col(ColumnDef::new(Visit::Country).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_visits_link_visited")
                    .table(Visit::Table)
                    .col(Visit::LinkId)
                    .col(Visit::VisitedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_visits_link_visited").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Visit::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_links_expires_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_links_scope_code").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Link::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Link {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    Scope,
    ShortCode,
    TargetUrl,
    OwnerId,
    Password,
    ExpiresAt,
    Banned,
    IsActive,
    VisitCount,
    HasSplashPage,
    HasCustomPreview,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Visit {
    #[sea_orm(iden = "visits")]
    Table,
    Id,
    LinkId,
    VisitedAt,
    ReferrerClass,
    DeviceClass,
    BrowserClass,
    Country,
}
