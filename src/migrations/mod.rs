pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_organizations;
mod m20260301_000003_create_organization_members;
mod m20260301_000004_create_services;
mod m20260301_000005_create_incidents;
mod m20260301_000006_create_incident_updates;
mod m20260301_000007_create_incident_services;
mod m20260301_000008_create_service_status_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_organizations::Migration),
            Box::new(m20260301_000003_create_organization_members::Migration),
            Box::new(m20260301_000004_create_services::Migration),
            Box::new(m20260301_000005_create_incidents::Migration),
            Box::new(m20260301_000006_create_incident_updates::Migration),
            Box::new(m20260301_000007_create_incident_services::Migration),
            Box::new(m20260301_000008_create_service_status_logs::Migration),
        ]
    }
}
