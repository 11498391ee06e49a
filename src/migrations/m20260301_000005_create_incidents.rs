//! Migration: Create incidents table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Incidents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Incidents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Incidents::Title).string().not_null())
                    .col(ColumnDef::new(Incidents::Description).string().null())
                    .col(
                        ColumnDef::new(Incidents::Status)
                            .string()
                            .not_null()
                            .default("investigating"),
                    )
                    .col(
                        ColumnDef::new(Incidents::Severity)
                            .string()
                            .not_null()
                            .default("minor"),
                    )
                    .col(
                        ColumnDef::new(Incidents::Kind)
                            .string()
                            .not_null()
                            .default("incident"),
                    )
                    .col(ColumnDef::new(Incidents::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Incidents::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Incidents::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Incidents::ResolvedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Incidents::ScheduledFor)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Incidents::ScheduledUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Incidents::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Incidents::NotifySubscribers)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Incidents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Incidents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incidents_organization")
                            .from(Incidents::Table, Incidents::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incidents_creator")
                            .from(Incidents::Table, Incidents::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incidents_organization")
                    .table(Incidents::Table)
                    .col(Incidents::OrganizationId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incidents_status")
                    .table(Incidents::Table)
                    .col(Incidents::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incidents_started_at")
                    .table(Incidents::Table)
                    .col(Incidents::StartedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Incidents::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "incidents"]
enum Incidents {
    Table,
    Id,
    Title,
    Description,
    Status,
    Severity,
    Kind,
    #[iden = "organization_id"]
    OrganizationId,
    #[iden = "created_by"]
    CreatedBy,
    #[iden = "started_at"]
    StartedAt,
    #[iden = "resolved_at"]
    ResolvedAt,
    #[iden = "scheduled_for"]
    ScheduledFor,
    #[iden = "scheduled_until"]
    ScheduledUntil,
    #[iden = "is_public"]
    IsPublic,
    #[iden = "notify_subscribers"]
    NotifySubscribers,
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

#[derive(Iden)]
#[iden = "users"]
enum Users {
    Table,
    Id,
}
