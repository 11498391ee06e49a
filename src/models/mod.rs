pub mod incident;
pub mod incident_service;
pub mod incident_update;
pub mod organization;
pub mod organization_member;
pub mod service;
pub mod service_status_log;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::incident::{self, Entity as Incident};
    pub use super::incident_service::{self, Entity as IncidentService};
    pub use super::incident_update::{self, Entity as IncidentUpdate};
    pub use super::organization::{self, Entity as Organization};
    pub use super::organization_member::{self, Entity as OrganizationMember};
    pub use super::service::{self, Entity as Service};
    pub use super::service_status_log::{self, Entity as ServiceStatusLog};
    pub use super::user::{self, Entity as User};
}
