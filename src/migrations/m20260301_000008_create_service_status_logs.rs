//! Migration: Create service_status_logs table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceStatusLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceStatusLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceStatusLogs::ServiceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceStatusLogs::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceStatusLogs::OldStatus).string().null())
                    .col(
                        ColumnDef::new(ServiceStatusLogs::NewStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceStatusLogs::ChangedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceStatusLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_status_logs_service")
                            .from(ServiceStatusLogs::Table, ServiceStatusLogs::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_status_logs_organization")
                            .from(ServiceStatusLogs::Table, ServiceStatusLogs::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_status_logs_user")
                            .from(ServiceStatusLogs::Table, ServiceStatusLogs::ChangedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_status_logs_service")
                    .table(ServiceStatusLogs::Table)
                    .col(ServiceStatusLogs::ServiceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_status_logs_organization")
                    .table(ServiceStatusLogs::Table)
                    .col(ServiceStatusLogs::OrganizationId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_status_logs_created_at")
                    .table(ServiceStatusLogs::Table)
                    .col(ServiceStatusLogs::CreatedAt)
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
                    .table(ServiceStatusLogs::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "service_status_logs"]
enum ServiceStatusLogs {
    Table,
    Id,
    #[iden = "service_id"]
    ServiceId,
    #[iden = "organization_id"]
    OrganizationId,
    #[iden = "old_status"]
    OldStatus,
    #[iden = "new_status"]
    NewStatus,
    #[iden = "changed_by"]
    ChangedBy,
    #[iden = "created_at"]
    CreatedAt,
}

#[derive(Iden)]
#[iden = "services"]
enum Services {
    Table,
    Id,
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
