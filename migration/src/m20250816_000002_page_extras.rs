use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 link_splash_pages 表（每个链接最多一条）
        manager
            .create_table(
                Table::create()
                    .table(SplashPage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SplashPage::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SplashPage::LinkId).string().not_null())
                    .col(
                        ColumnDef::new(SplashPage::TemplateType)
                            .string_len(50)
                            .not_null()
                            .default("minimal"),
                    )
                    .col(ColumnDef::new(SplashPage::CustomHtml).text().null())
                    .col(ColumnDef::new(SplashPage::CustomCss).text().null())
                    .col(ColumnDef::new(SplashPage::BrandingConfig).text().null())
                    .col(
                        ColumnDef::new(SplashPage::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SplashPage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SplashPage::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_splash_pages_link_id")
                    .table(SplashPage::Table)
                    .col(SplashPage::LinkId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 link_previews 表（每个链接最多一条）
        manager
            .create_table(
                Table::create()
                    .table(LinkPreview::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkPreview::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LinkPreview::LinkId).string().not_null())
                    .col(ColumnDef::new(LinkPreview::OgTitle).string_len(200).null())
                    .col(ColumnDef::new(LinkPreview::OgDescription).text().null())
                    .col(
                        ColumnDef::new(LinkPreview::OgImageUrl)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LinkPreview::TwitterCardType)
                            .string_len(50)
                            .not_null()
                            .default("summary"),
                    )
                    .col(
                        ColumnDef::new(LinkPreview::CustomPreviewConfig)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LinkPreview::AutoGenerated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LinkPreview::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkPreview::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_link_previews_link_id")
                    .table(LinkPreview::Table)
                    .col(LinkPreview::LinkId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // tags：类型化的标签关联表，替代原先的自由文本 JSON 字段
        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tag::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tag::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkTag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LinkTag::LinkId).string().not_null())
                    .col(ColumnDef::new(LinkTag::TagId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(LinkTag::LinkId)
                            .col(LinkTag::TagId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkTag::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_link_previews_link_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(LinkPreview::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_splash_pages_link_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SplashPage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SplashPage {
    #[sea_orm(iden = "link_splash_pages")]
    Table,
    Id,
    LinkId,
    TemplateType,
    CustomHtml,
    CustomCss,
    BrandingConfig,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LinkPreview {
    #[sea_orm(iden = "link_previews")]
    Table,
    Id,
    LinkId,
    OgTitle,
    OgDescription,
    OgImageUrl,
    TwitterCardType,
    CustomPreviewConfig,
    AutoGenerated,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tag {
    #[sea_orm(iden = "tags")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum LinkTag {
    #[sea_orm(iden = "link_tags")]
    Table,
    LinkId,
    TagId,
}
