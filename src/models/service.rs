use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// One of the five `ServiceStatus` values; validated before every write.
    pub status: String,
    pub url: Option<String>,
    pub organization_id: Uuid,
    pub sort_order: i32,
    pub is_public: bool,
    /// Operator-entered, 1-100.
    pub uptime_percentage: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::incident_service::Entity")]
    IncidentLinks,
    #[sea_orm(has_many = "super::service_status_log::Entity")]
    StatusLogs,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        super::incident_service::Relation::Incident.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::incident_service::Relation::Service.def().rev())
    }
}

impl Related<super::service_status_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
