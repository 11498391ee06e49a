//! Migration: Create incident_services association table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IncidentServices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncidentServices::IncidentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncidentServices::ServiceId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(IncidentServices::IncidentId)
                            .col(IncidentServices::ServiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incident_services_incident")
                            .from(IncidentServices::Table, IncidentServices::IncidentId)
                            .to(Incidents::Table, Incidents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_incident_services_service")
                            .from(IncidentServices::Table, IncidentServices::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(IncidentServices::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "incident_services"]
enum IncidentServices {
    Table,
    #[iden = "incident_id"]
    IncidentId,
    #[iden = "service_id"]
    ServiceId,
}

#[derive(Iden)]
#[iden = "incidents"]
enum Incidents {
    Table,
    Id,
}

#[derive(Iden)]
#[iden = "services"]
enum Services {
    Table,
    Id,
}
