use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::endpoints::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;
use crate::models::{incident, incident_service, service, service_status_log};
use crate::schemas::{
    parse_enum_field, validate_payload, CreateServiceRequest, ReorderServicesRequest,
    UpdateServiceRequest, UpdateServiceStatusRequest, UpdateServiceUptimeRequest,
};
use crate::services::access::{require_org_admin, resolve_org_access};
use crate::services::status::ServiceStatus;
use crate::services::status_log;
use crate::state::AppState;

/// Create service routes
pub fn services_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/organization/{organization_id}",
            get(list_services).post(create_service),
        )
        .route(
            "/organization/{organization_id}/reorder",
            put(reorder_services),
        )
        .route(
            "/{service_id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/{service_id}/status", patch(update_service_status))
        .route("/{service_id}/uptime", patch(update_service_uptime))
        .with_state(state)
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IncidentRef {
    id: Uuid,
    title: String,
    status: String,
    severity: String,
    #[serde(rename = "type")]
    kind: String,
    started_at: chrono::DateTime<chrono::Utc>,
}

impl From<incident::Model> for IncidentRef {
    fn from(i: incident::Model) -> Self {
        Self {
            id: i.id,
            title: i.title,
            status: i.status,
            severity: i.severity,
            kind: i.kind,
            started_at: i.started_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceWithIncidents {
    #[serde(flatten)]
    service: service::Model,
    active_incidents: Vec<IncidentRef>,
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn find_service(state: &AppState, service_id: Uuid) -> Result<service::Model> {
    Service::find_by_id(service_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))
}

/// Unresolved incidents currently associated with a service.
async fn active_incidents_for(state: &AppState, service_id: Uuid) -> Result<Vec<IncidentRef>> {
    let incident_ids: Vec<Uuid> = IncidentService::find()
        .filter(incident_service::Column::ServiceId.eq(service_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|l| l.incident_id)
        .collect();

    if incident_ids.is_empty() {
        return Ok(Vec::new());
    }

    let incidents = Incident::find()
        .filter(incident::Column::Id.is_in(incident_ids))
        .filter(incident::Column::Status.ne("resolved"))
        .order_by_desc(incident::Column::StartedAt)
        .all(&state.db)
        .await?;

    Ok(incidents.into_iter().map(IncidentRef::from).collect())
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// List an organization's services with their active incidents attached.
async fn list_services(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    resolve_org_access(&state.db, &auth_user.0, organization_id).await?;

    let services = Service::find()
        .filter(service::Column::OrganizationId.eq(organization_id))
        .order_by_asc(service::Column::SortOrder)
        .order_by_asc(service::Column::Name)
        .all(&state.db)
        .await?;

    let mut rows = Vec::with_capacity(services.len());
    for svc in services {
        let active_incidents = active_incidents_for(&state, svc.id).await?;
        rows.push(ServiceWithIncidents {
            service: svc,
            active_incidents,
        });
    }

    Ok(ApiResponse::new(serde_json::json!({ "services": rows })))
}

/// Create a new service (organization admin only).
async fn create_service(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    require_org_admin(&state.db, &auth_user.0, organization_id).await?;
    validate_payload(&request)?;

    let status = match &request.status {
        Some(raw) => parse_enum_field::<ServiceStatus>("status", raw)?,
        None => ServiceStatus::Operational,
    };

    let now = Utc::now();
    let row = service::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(request.name),
        description: Set(request.description),
        status: Set(status.as_str().to_string()),
        url: Set(request.url),
        organization_id: Set(organization_id),
        sort_order: Set(request.sort_order.unwrap_or(0)),
        is_public: Set(request.is_public.unwrap_or(true)),
        uptime_percentage: Set(100.0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = row.insert(&state.db).await?;

    let Json(body) = ApiResponse::with_message(
        "Service created successfully",
        serde_json::json!({ "service": created }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

/// Service details with its ten most recent incidents.
async fn get_service(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let svc = find_service(&state, service_id).await?;
    let access = resolve_org_access(&state.db, &auth_user.0, svc.organization_id).await?;

    let incident_ids: Vec<Uuid> = IncidentService::find()
        .filter(incident_service::Column::ServiceId.eq(service_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|l| l.incident_id)
        .collect();

    let recent_incidents = if incident_ids.is_empty() {
        Vec::new()
    } else {
        Incident::find()
            .filter(incident::Column::Id.is_in(incident_ids))
            .order_by_desc(incident::Column::StartedAt)
            .limit(10)
            .all(&state.db)
            .await?
            .into_iter()
            .map(IncidentRef::from)
            .collect()
    };

    Ok(ApiResponse::new(serde_json::json!({
        "service": svc,
        "organization": {
            "id": access.organization.id,
            "name": access.organization.name,
            "slug": access.organization.slug,
        },
        "recentIncidents": recent_incidents,
    })))
}

/// Update service fields (admin). A status change through this route is
/// routed through the audited mutation path so no transition escapes the log.
async fn update_service(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let svc = find_service(&state, service_id).await?;
    require_org_admin(&state.db, &auth_user.0, svc.organization_id).await?;
    validate_payload(&request)?;

    let new_status = match &request.status {
        Some(raw) => Some(parse_enum_field::<ServiceStatus>("status", raw)?),
        None => None,
    };

    let mut active: service::ActiveModel = svc.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(url) = request.url {
        active.url = Set(Some(url));
    }
    if let Some(sort_order) = request.sort_order {
        active.sort_order = Set(sort_order);
    }
    if let Some(is_public) = request.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(Utc::now());
    let mut updated = active.update(&state.db).await?;

    if let Some(status) = new_status {
        let change = status_log::change_service_status(&state, service_id, status, &auth_user.0)
            .await?;
        updated = change.service;
    }

    Ok(ApiResponse::with_message(
        "Service updated successfully",
        serde_json::json!({ "service": updated }),
    ))
}

/// Delete a service with explicit cascades to its audit rows and incident
/// links.
async fn delete_service(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let svc = find_service(&state, service_id).await?;
    require_org_admin(&state.db, &auth_user.0, svc.organization_id).await?;

    let txn = state.db.begin().await?;
    ServiceStatusLog::delete_many()
        .filter(service_status_log::Column::ServiceId.eq(service_id))
        .exec(&txn)
        .await?;
    IncidentService::delete_many()
        .filter(incident_service::Column::ServiceId.eq(service_id))
        .exec(&txn)
        .await?;
    svc.delete(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::with_message(
        "Service deleted successfully",
        serde_json::json!({}),
    ))
}

/// Change a service's status. Audited and pushed to subscribers.
async fn update_service_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceStatusRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let svc = find_service(&state, service_id).await?;
    require_org_admin(&state.db, &auth_user.0, svc.organization_id).await?;

    let status = parse_enum_field::<ServiceStatus>("status", &request.status)?;

    let change = status_log::change_service_status(&state, service_id, status, &auth_user.0).await?;

    Ok(ApiResponse::with_message(
        "Service status updated successfully",
        serde_json::json!({
            "service": change.service,
            "statusChanged": change.status_changed,
            "overallStatus": change.overall.as_str(),
        }),
    ))
}

/// Set the operator-entered uptime percentage.
async fn update_service_uptime(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceUptimeRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let svc = find_service(&state, service_id).await?;
    require_org_admin(&state.db, &auth_user.0, svc.organization_id).await?;
    validate_payload(&request)?;

    let uptime_changed = svc.uptime_percentage != request.uptime_percentage;

    let mut active: service::ActiveModel = svc.into();
    active.uptime_percentage = Set(request.uptime_percentage);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Service uptime updated successfully",
        serde_json::json!({
            "service": updated,
            "uptimeChanged": uptime_changed,
        }),
    ))
}

/// Persist a new display order for an organization's services.
async fn reorder_services(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<ReorderServicesRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    require_org_admin(&state.db, &auth_user.0, organization_id).await?;

    let txn = state.db.begin().await?;
    for (position, service_id) in request.service_ids.iter().enumerate() {
        // Only services of this organization move; foreign ids are ignored.
        let Some(svc) = Service::find_by_id(*service_id)
            .filter(service::Column::OrganizationId.eq(organization_id))
            .one(&txn)
            .await?
        else {
            continue;
        };
        let mut active: service::ActiveModel = svc.into();
        active.sort_order = Set(position as i32);
        active.update(&txn).await?;
    }
    txn.commit().await?;

    let services = Service::find()
        .filter(service::Column::OrganizationId.eq(organization_id))
        .order_by_asc(service::Column::SortOrder)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::with_message(
        "Services reordered successfully",
        serde_json::json!({ "services": services }),
    ))
}
