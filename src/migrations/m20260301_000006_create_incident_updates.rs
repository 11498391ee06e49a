//! Migration: Create incident_updates table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IncidentUpdates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncidentUpdates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IncidentUpdates::IncidentId).uuid().not_null())
                    .col(ColumnDef::new(IncidentUpdates::Title).string().not_null())
                    .col(
                        ColumnDef::new(IncidentUpdates::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncidentUpdates::Status).string().not_null())
                    .col(ColumnDef::new(IncidentUpdates::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(IncidentUpdates::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(IncidentUpdates::NotifySubscribers)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(IncidentUpdates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incident_updates_incident")
                            .from(IncidentUpdates::Table, IncidentUpdates::IncidentId)
                            .to(Incidents::Table, Incidents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incident_updates_creator")
                            .from(IncidentUpdates::Table, IncidentUpdates::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incident_updates_incident")
                    .table(IncidentUpdates::Table)
                    .col(IncidentUpdates::IncidentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incident_updates_created_at")
                    .table(IncidentUpdates::Table)
                    .col(IncidentUpdates::CreatedAt)
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
                    .table(IncidentUpdates::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "incident_updates"]
enum IncidentUpdates {
    Table,
    Id,
    #[iden = "incident_id"]
    IncidentId,
    Title,
    Description,
    Status,
    #[iden = "created_by"]
    CreatedBy,
    #[iden = "is_public"]
    IsPublic,
    #[iden = "notify_subscribers"]
    NotifySubscribers,
    #[iden = "created_at"]
    CreatedAt,
}

#[derive(Iden)]
#[iden = "incidents"]
enum Incidents {
    Table,
    Id,
}

#[derive(Iden)]
#[iden = "users"]
enum Users {
    Table,
    Id,
}
