use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// "investigating" | "identified" | "monitoring" | "resolved"
    pub status: String,
    /// "minor" | "major" | "critical"
    pub severity: String,
    /// "incident" | "maintenance"
    pub kind: String,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub started_at: DateTimeUtc,
    /// Set exactly once, when the incident first reaches "resolved".
    pub resolved_at: Option<DateTimeUtc>,
    pub scheduled_for: Option<DateTimeUtc>,
    pub scheduled_until: Option<DateTimeUtc>,
    pub is_public: bool,
    pub notify_subscribers: bool,
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
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::incident_update::Entity")]
    Updates,
    #[sea_orm(has_many = "super::incident_service::Entity")]
    ServiceLinks,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::incident_update::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        super::incident_service::Relation::Service.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::incident_service::Relation::Incident.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
