//! Migration: Create services table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Services::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Services::Name).string().not_null())
                    .col(ColumnDef::new(Services::Description).string().null())
                    .col(
                        ColumnDef::new(Services::Status)
                            .string()
                            .not_null()
                            .default("operational"),
                    )
                    .col(ColumnDef::new(Services::Url).string().null())
                    .col(ColumnDef::new(Services::OrganizationId).uuid().not_null())
                    .col(
                        ColumnDef::new(Services::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Services::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Services::UptimePercentage)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(
                        ColumnDef::new(Services::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Services::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_services_organization")
                            .from(Services::Table, Services::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_services_organization")
                    .table(Services::Table)
                    .col(Services::OrganizationId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_services_status")
                    .table(Services::Table)
                    .col(Services::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Services::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "services"]
enum Services {
    Table,
    Id,
    Name,
    Description,
    Status,
    Url,
    #[iden = "organization_id"]
    OrganizationId,
    #[iden = "sort_order"]
    SortOrder,
    #[iden = "is_public"]
    IsPublic,
    #[iden = "uptime_percentage"]
    UptimePercentage,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

#[derive(Iden)]
#[iden = "organizations"]
enum Organizations {
    Table,
    Id,
}
