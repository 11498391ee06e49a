//! Migration: Create organizations table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .col(
                        ColumnDef::new(Organizations::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Organizations::Description).string().null())
                    .col(ColumnDef::new(Organizations::LogoUrl).string().null())
                    .col(ColumnDef::new(Organizations::WebsiteUrl).string().null())
                    .col(
                        ColumnDef::new(Organizations::PrimaryColor)
                            .string()
                            .not_null()
                            .default("#3b82f6"),
                    )
                    .col(
                        ColumnDef::new(Organizations::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Organizations::CustomDomain).string().null())
                    .col(
                        ColumnDef::new(Organizations::AccessCode)
                            .string_len(7)
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Organizations::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .col(ColumnDef::new(Organizations::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Organizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Organizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organizations_owner")
                            .from(Organizations::Table, Organizations::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_slug")
                    .table(Organizations::Table)
                    .col(Organizations::Slug)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organizations_owner")
                    .table(Organizations::Table)
                    .col(Organizations::OwnerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Organizations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "organizations"]
enum Organizations {
    Table,
    Id,
    Name,
    Slug,
    Description,
    #[iden = "logo_url"]
    LogoUrl,
    #[iden = "website_url"]
    WebsiteUrl,
    #[iden = "primary_color"]
    PrimaryColor,
    #[iden = "is_public"]
    IsPublic,
    #[iden = "custom_domain"]
    CustomDomain,
    #[iden = "access_code"]
    AccessCode,
    Timezone,
    #[iden = "owner_id"]
    OwnerId,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

#[derive(Iden)]
#[iden = "users"]
enum Users {
    Table,
    Id,
}
