use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::endpoints::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;
use crate::models::{incident, organization, organization_member, service, user};
use crate::schemas::{
    validate_payload, CreateOrganizationRequest, InviteMemberRequest, JoinOrganizationRequest,
    UpdateMemberRoleRequest, UpdateOrganizationRequest,
};
use crate::services::access::{require_org_admin, resolve_org_access};
use crate::services::status_log;
use crate::state::AppState;

/// Create organization routes
pub fn organizations_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route("/join", post(join_organization))
        .route(
            "/{organization_id}",
            get(get_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
        .route(
            "/{organization_id}/members",
            get(list_members).post(invite_member),
        )
        .route(
            "/{organization_id}/members/{member_id}",
            put(update_member_role).delete(remove_member),
        )
        .route("/{organization_id}/status-changes", get(list_status_changes))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationSummary {
    #[serde(flatten)]
    organization: organization::Model,
    role: String,
    is_owner: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationStats {
    service_count: u64,
    active_incident_count: u64,
    upcoming_maintenance_count: u64,
    member_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberEntry {
    id: Option<Uuid>,
    user: MemberUser,
    role: String,
    status: String,
    is_owner: bool,
    joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberUser {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<user::Model> for MemberUser {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            last_login_at: u.last_login_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    limit: Option<u64>,
    offset: Option<u64>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Generate a random 7-digit access code
fn generate_access_code() -> String {
    rand::rng().random_range(1_000_000..10_000_000u32).to_string()
}

/// Generate an access code not yet taken by any organization.
async fn generate_unique_access_code(state: &AppState) -> Result<String> {
    for _ in 0..10 {
        let code = generate_access_code();
        let taken = Organization::find()
            .filter(organization::Column::AccessCode.eq(code.clone()))
            .one(&state.db)
            .await?
            .is_some();
        if !taken {
            return Ok(code);
        }
    }
    Err(AppError::Internal(
        "Unable to generate unique access code".to_string(),
    ))
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// List organizations the caller owns or belongs to, owned first.
async fn list_organizations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let owned = Organization::find()
        .filter(organization::Column::OwnerId.eq(auth_user.0.id))
        .order_by_asc(organization::Column::Name)
        .all(&state.db)
        .await?;

    let memberships = OrganizationMember::find()
        .filter(organization_member::Column::UserId.eq(auth_user.0.id))
        .filter(organization_member::Column::Status.eq("active"))
        .all(&state.db)
        .await?;

    let mut summaries: Vec<OrganizationSummary> = Vec::new();
    let mut seen: Vec<Uuid> = Vec::new();

    for org in owned {
        seen.push(org.id);
        summaries.push(OrganizationSummary {
            organization: org,
            role: "admin".to_string(),
            is_owner: true,
        });
    }

    // Member organizations only when not already listed as owned.
    for membership in memberships {
        if seen.contains(&membership.organization_id) {
            continue;
        }
        if let Some(org) = Organization::find_by_id(membership.organization_id)
            .one(&state.db)
            .await?
        {
            summaries.push(OrganizationSummary {
                organization: org,
                role: membership.role,
                is_owner: false,
            });
        }
    }

    Ok(ApiResponse::new(
        serde_json::json!({ "organizations": summaries }),
    ))
}

/// Create a new organization (global admin only).
async fn create_organization(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    if auth_user.0.role != "admin" {
        return Err(AppError::Forbidden("Insufficient permissions".to_string()));
    }
    validate_payload(&request)?;

    let slug_taken = Organization::find()
        .filter(organization::Column::Slug.eq(request.slug.clone()))
        .one(&state.db)
        .await?
        .is_some();
    if slug_taken {
        return Err(AppError::Conflict {
            field: "slug".to_string(),
            message: "Organization slug is already taken".to_string(),
        });
    }

    let access_code = generate_unique_access_code(&state).await?;

    let now = Utc::now();
    let org = organization::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(request.name),
        slug: Set(request.slug),
        description: Set(request.description),
        logo_url: Set(request.logo_url),
        website_url: Set(request.website_url),
        primary_color: Set(request.primary_color.unwrap_or_else(|| "#3b82f6".to_string())),
        is_public: Set(true),
        custom_domain: Set(None),
        access_code: Set(Some(access_code)),
        timezone: Set(request.timezone.unwrap_or_else(|| "UTC".to_string())),
        owner_id: Set(auth_user.0.id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = org.insert(&state.db).await?;

    // The creator is also recorded as an admin member.
    let membership = organization_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(auth_user.0.id),
        organization_id: Set(created.id),
        role: Set("admin".to_string()),
        status: Set("active".to_string()),
        invited_by: Set(None),
        invited_at: Set(None),
        joined_at: Set(now),
    };
    membership.insert(&state.db).await?;

    let Json(body) = ApiResponse::with_message(
        "Organization created successfully",
        serde_json::json!({ "organization": created }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

/// Organization details plus dashboard stats.
async fn get_organization(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let access = resolve_org_access(&state.db, &auth_user.0, organization_id).await?;
    let org = access.organization;

    let service_count = Service::find()
        .filter(service::Column::OrganizationId.eq(org.id))
        .count(&state.db)
        .await?;
    let active_incident_count = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Status.ne("resolved"))
        .count(&state.db)
        .await?;
    let upcoming_maintenance_count = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Kind.eq("maintenance"))
        .filter(incident::Column::ScheduledFor.gte(Utc::now()))
        .count(&state.db)
        .await?;
    let member_count = OrganizationMember::find()
        .filter(organization_member::Column::OrganizationId.eq(org.id))
        .filter(organization_member::Column::Status.eq("active"))
        .count(&state.db)
        .await?;

    let overall = status_log::organization_overall_status(&state.db, org.id).await?;

    Ok(ApiResponse::new(serde_json::json!({
        "organization": org,
        "stats": OrganizationStats {
            service_count,
            active_incident_count,
            upcoming_maintenance_count,
            member_count,
        },
        "overallStatus": overall.status.as_str(),
        "userRole": access.role.as_str(),
    })))
}

async fn update_organization(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<UpdateOrganizationRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let access = require_org_admin(&state.db, &auth_user.0, organization_id).await?;
    validate_payload(&request)?;

    let mut active: organization::ActiveModel = access.organization.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(website_url) = request.website_url {
        active.website_url = Set(Some(website_url));
    }
    if let Some(logo_url) = request.logo_url {
        active.logo_url = Set(Some(logo_url));
    }
    if let Some(primary_color) = request.primary_color {
        active.primary_color = Set(primary_color);
    }
    if let Some(timezone) = request.timezone {
        active.timezone = Set(timezone);
    }
    if let Some(is_public) = request.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Organization updated successfully",
        serde_json::json!({ "organization": updated }),
    ))
}

/// Delete an organization. Owner only; members and admins cannot.
async fn delete_organization(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let access = resolve_org_access(&state.db, &auth_user.0, organization_id).await?;

    if access.organization.owner_id != auth_user.0.id {
        return Err(AppError::Forbidden(
            "Only organization owner can delete the organization".to_string(),
        ));
    }

    access.organization.delete(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Organization deleted successfully",
        serde_json::json!({}),
    ))
}

/// List members. The owner appears first as a synthetic entry; there is no
/// membership row for the owner.
async fn list_members(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let access = resolve_org_access(&state.db, &auth_user.0, organization_id).await?;
    let org = access.organization;

    let owner = User::find_by_id(org.owner_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization owner not found".to_string()))?;

    let memberships = OrganizationMember::find()
        .filter(organization_member::Column::OrganizationId.eq(org.id))
        .order_by_asc(organization_member::Column::JoinedAt)
        .all(&state.db)
        .await?;

    let mut members = vec![MemberEntry {
        id: None,
        user: owner.into(),
        role: "admin".to_string(),
        status: "active".to_string(),
        is_owner: true,
        joined_at: org.created_at,
    }];

    for membership in memberships {
        // Skip the owner's own membership row to avoid a duplicate entry.
        if membership.user_id == org.owner_id {
            continue;
        }
        let Some(member_user) = User::find_by_id(membership.user_id).one(&state.db).await? else {
            continue;
        };
        members.push(MemberEntry {
            id: Some(membership.id),
            user: member_user.into(),
            role: membership.role,
            status: membership.status,
            is_owner: false,
            joined_at: membership.joined_at,
        });
    }

    Ok(ApiResponse::new(serde_json::json!({ "members": members })))
}

/// Add an existing user to the organization by email (admin only).
async fn invite_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<InviteMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    require_org_admin(&state.db, &auth_user.0, organization_id).await?;
    validate_payload(&request)?;

    let role = request.role.unwrap_or_else(|| "member".to_string());
    if role != "admin" && role != "member" {
        return Err(AppError::validation("role", "Role must be admin or member"));
    }

    let invited = User::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User with this email not found".to_string()))?;

    let existing = OrganizationMember::find()
        .filter(organization_member::Column::UserId.eq(invited.id))
        .filter(organization_member::Column::OrganizationId.eq(organization_id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict {
            field: "email".to_string(),
            message: "User is already a member of this organization".to_string(),
        });
    }

    let now = Utc::now();
    let membership = organization_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(invited.id),
        organization_id: Set(organization_id),
        role: Set(role),
        status: Set("active".to_string()),
        invited_by: Set(Some(auth_user.0.id)),
        invited_at: Set(Some(now)),
        joined_at: Set(now),
    };
    let created = membership.insert(&state.db).await?;

    let Json(body) = ApiResponse::with_message(
        "Member added successfully",
        serde_json::json!({
            "membership": created,
            "user": MemberUser::from(invited),
        }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((organization_id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    require_org_admin(&state.db, &auth_user.0, organization_id).await?;

    if request.role != "admin" && request.role != "member" {
        return Err(AppError::validation("role", "Role must be admin or member"));
    }

    let membership = OrganizationMember::find_by_id(member_id)
        .filter(organization_member::Column::OrganizationId.eq(organization_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    let mut active: organization_member::ActiveModel = membership.into();
    active.role = Set(request.role);
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Member role updated successfully",
        serde_json::json!({ "membership": updated }),
    ))
}

async fn remove_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((organization_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    require_org_admin(&state.db, &auth_user.0, organization_id).await?;

    let membership = OrganizationMember::find_by_id(member_id)
        .filter(organization_member::Column::OrganizationId.eq(organization_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;

    membership.delete(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Member removed successfully",
        serde_json::json!({}),
    ))
}

/// Self-service join with an organization slug and access code.
async fn join_organization(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<JoinOrganizationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    validate_payload(&request)?;

    let org = Organization::find()
        .filter(organization::Column::Slug.eq(request.slug.clone()))
        .filter(organization::Column::AccessCode.eq(request.access_code.clone()))
        .filter(organization::Column::IsPublic.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Organization not found or invalid access code".to_string())
        })?;

    if org.owner_id == auth_user.0.id {
        return Err(AppError::Conflict {
            field: "slug".to_string(),
            message: "You are already a member of this organization".to_string(),
        });
    }

    let existing = OrganizationMember::find()
        .filter(organization_member::Column::UserId.eq(auth_user.0.id))
        .filter(organization_member::Column::OrganizationId.eq(org.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict {
            field: "slug".to_string(),
            message: "You are already a member of this organization".to_string(),
        });
    }

    let membership = organization_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(auth_user.0.id),
        organization_id: Set(org.id),
        role: Set("member".to_string()),
        status: Set("active".to_string()),
        invited_by: Set(None),
        invited_at: Set(None),
        joined_at: Set(Utc::now()),
    };
    membership.insert(&state.db).await?;

    let Json(body) = ApiResponse::with_message(
        "Successfully joined organization",
        serde_json::json!({
            "organization": { "id": org.id, "name": org.name, "slug": org.slug },
        }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

/// Newest-first audit trail of service status changes for an organization.
async fn list_status_changes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    resolve_org_access(&state.db, &auth_user.0, organization_id).await?;

    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0);
    let changes =
        status_log::list_status_changes(&state.db, organization_id, limit, offset).await?;

    Ok(ApiResponse::new(
        serde_json::json!({ "statusChanges": changes }),
    ))
}
