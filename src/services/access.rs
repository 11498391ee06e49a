//! Organization access resolution.
//!
//! The core trusts the identity layer (JWT -> user) and only checks the
//! resolved organization role where an operation is admin-only.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{organization, organization_member, user};
use crate::state::DbConn;

/// Caller's role within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, OrgRole::Admin)
    }
}

/// Resolved access to an organization: the row itself plus the caller's role.
pub struct OrgAccess {
    pub organization: organization::Model,
    pub role: OrgRole,
}

/// Resolve the caller's role for `organization_id`.
///
/// The owner is an implicit admin; otherwise an active membership row decides.
/// Denied access is `Forbidden`, a missing organization is `NotFound`.
pub async fn resolve_org_access(
    db: &DbConn,
    caller: &user::Model,
    organization_id: Uuid,
) -> Result<OrgAccess> {
    let organization = Organization::find_by_id(organization_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    if organization.owner_id == caller.id {
        return Ok(OrgAccess {
            organization,
            role: OrgRole::Admin,
        });
    }

    let membership = OrganizationMember::find()
        .filter(organization_member::Column::UserId.eq(caller.id))
        .filter(organization_member::Column::OrganizationId.eq(organization_id))
        .filter(organization_member::Column::Status.eq("active"))
        .one(db)
        .await?;

    match membership {
        Some(member) if member.role == "admin" => Ok(OrgAccess {
            organization,
            role: OrgRole::Admin,
        }),
        Some(_) => Ok(OrgAccess {
            organization,
            role: OrgRole::Member,
        }),
        None => Err(AppError::Forbidden(
            "Access to this organization is denied".to_string(),
        )),
    }
}

/// Like [`resolve_org_access`] but additionally requires the admin role.
pub async fn require_org_admin(
    db: &DbConn,
    caller: &user::Model,
    organization_id: Uuid,
) -> Result<OrgAccess> {
    let access = resolve_org_access(db, caller, organization_id).await?;
    if !access.role.is_admin() {
        return Err(AppError::Forbidden(
            "Organization admin privileges required".to_string(),
        ));
    }
    Ok(access)
}
