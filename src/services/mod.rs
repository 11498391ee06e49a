pub mod access;
pub mod incident;
pub mod locks;
pub mod realtime;
pub mod security;
pub mod status;
pub mod status_log;
pub mod timeline;

pub use access::{require_org_admin, resolve_org_access, OrgAccess, OrgRole};
pub use security::{create_access_token, decode_token, hash_password, verify_password};
pub use status::{derive_overall_status, IncidentKind, IncidentSeverity, IncidentStatus, ServiceStatus};
