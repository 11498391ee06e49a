use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use sea_orm::EntityTrait;
use serde::Deserialize;
use uuid::Uuid;

use crate::endpoints::ApiResponse;
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::User;
use crate::schemas::{
    parse_enum_field, validate_payload, CreateIncidentRequest, CreateIncidentUpdateRequest,
    UpdateIncidentRequest,
};
use crate::services::access::{require_org_admin, resolve_org_access};
use crate::services::incident::{
    self, IncidentPatch, NewIncident, NewIncidentUpdate,
};
use crate::services::status::{IncidentKind, IncidentSeverity, IncidentStatus};
use crate::services::timeline::{self, TimelineQuery};
use crate::state::AppState;

/// Create incident routes
pub fn incidents_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/organization/{organization_id}",
            get(list_incidents).post(create_incident),
        )
        .route("/organization/{organization_id}/timeline", get(get_timeline))
        .route(
            "/{incident_id}",
            get(get_incident)
                .put(update_incident)
                .delete(delete_incident),
        )
        .route(
            "/{incident_id}/updates",
            get(list_incident_updates).post(post_incident_update),
        )
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListIncidentsParams {
    /// Single status or comma-separated list.
    status: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TimelineParams {
    limit: Option<u64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
    search: Option<String>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn list_incidents(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<ListIncidentsParams>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    resolve_org_access(&state.db, &auth_user.0, organization_id).await?;

    let statuses = match &params.status {
        Some(raw) => {
            let mut parsed = Vec::new();
            for part in raw.split(',') {
                parsed.push(parse_enum_field::<IncidentStatus>("status", part.trim())?);
            }
            Some(parsed)
        }
        None => None,
    };
    let kind = match &params.kind {
        Some(raw) => Some(parse_enum_field::<IncidentKind>("type", raw)?),
        None => None,
    };

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let result =
        incident::list_incidents(&state.db, organization_id, statuses, kind, page, limit).await?;

    let mut rows = Vec::with_capacity(result.incidents.len());
    for row in result.incidents {
        let affected = incident::affected_services(&state.db, &row).await?;
        let latest = incident::latest_update(&state.db, row.id).await?;
        rows.push(serde_json::json!({
            "incident": row,
            "affectedServices": affected
                .iter()
                .map(|s| serde_json::json!({ "id": s.id, "name": s.name, "status": s.status }))
                .collect::<Vec<_>>(),
            "latestUpdate": latest,
        }));
    }

    let pages = result.total.div_ceil(limit);
    Ok(ApiResponse::new(serde_json::json!({
        "incidents": rows,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": result.total,
            "pages": pages,
        },
    })))
}

async fn create_incident(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Json(request): Json<CreateIncidentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    let access = require_org_admin(&state.db, &auth_user.0, organization_id).await?;
    validate_payload(&request)?;

    let input = NewIncident {
        title: request.title,
        description: request.description,
        status: match &request.status {
            Some(raw) => parse_enum_field("status", raw)?,
            None => IncidentStatus::Investigating,
        },
        severity: match &request.severity {
            Some(raw) => parse_enum_field("severity", raw)?,
            None => IncidentSeverity::Minor,
        },
        kind: match &request.kind {
            Some(raw) => parse_enum_field("type", raw)?,
            None => IncidentKind::Incident,
        },
        service_ids: request.service_ids,
        scheduled_for: request.scheduled_for,
        scheduled_until: request.scheduled_until,
        is_public: request.is_public.unwrap_or(true),
        notify_subscribers: request.notify_subscribers.unwrap_or(true),
    };

    let created = incident::create_incident(&state, &access.organization, &auth_user.0, input).await?;
    let affected = incident::affected_services(&state.db, &created).await?;
    let updates = incident::list_updates(&state.db, created.id).await?;

    let Json(body) = ApiResponse::with_message(
        "Incident created successfully",
        serde_json::json!({
            "incident": created,
            "affectedServices": affected,
            "updates": updates,
        }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

async fn get_incident(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(incident_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let found = incident::find_incident(&state.db, incident_id).await?;
    let access = resolve_org_access(&state.db, &auth_user.0, found.organization_id).await?;

    let creator = User::find_by_id(found.created_by).one(&state.db).await?;
    let affected = incident::affected_services(&state.db, &found).await?;
    let updates = incident::list_updates(&state.db, incident_id).await?;

    Ok(ApiResponse::new(serde_json::json!({
        "incident": found,
        "creator": creator.map(|u| serde_json::json!({
            "id": u.id,
            "firstName": u.first_name,
            "lastName": u.last_name,
            "email": u.email,
        })),
        "affectedServices": affected,
        "updates": updates,
        "organization": {
            "id": access.organization.id,
            "name": access.organization.name,
            "slug": access.organization.slug,
        },
    })))
}

async fn update_incident(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(incident_id): Path<Uuid>,
    Json(request): Json<UpdateIncidentRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let found = incident::find_incident(&state.db, incident_id).await?;
    require_org_admin(&state.db, &auth_user.0, found.organization_id).await?;
    validate_payload(&request)?;

    let patch = IncidentPatch {
        title: request.title,
        description: request.description,
        status: match &request.status {
            Some(raw) => Some(parse_enum_field("status", raw)?),
            None => None,
        },
        severity: match &request.severity {
            Some(raw) => Some(parse_enum_field("severity", raw)?),
            None => None,
        },
        service_ids: request.service_ids,
        scheduled_for: request.scheduled_for,
        scheduled_until: request.scheduled_until,
        is_public: request.is_public,
        notify_subscribers: request.notify_subscribers,
    };

    let updated = incident::update_incident(&state, incident_id, patch).await?;
    let affected = incident::affected_services(&state.db, &updated).await?;

    Ok(ApiResponse::with_message(
        "Incident updated successfully",
        serde_json::json!({
            "incident": updated,
            "affectedServices": affected,
        }),
    ))
}

async fn delete_incident(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(incident_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let found = incident::find_incident(&state.db, incident_id).await?;
    require_org_admin(&state.db, &auth_user.0, found.organization_id).await?;

    incident::delete_incident(&state, incident_id).await?;

    Ok(ApiResponse::with_message(
        "Incident deleted successfully",
        serde_json::json!({}),
    ))
}

async fn post_incident_update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(incident_id): Path<Uuid>,
    Json(request): Json<CreateIncidentUpdateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>)> {
    let found = incident::find_incident(&state.db, incident_id).await?;
    require_org_admin(&state.db, &auth_user.0, found.organization_id).await?;
    validate_payload(&request)?;

    let input = NewIncidentUpdate {
        title: request.title,
        description: request.description,
        status: parse_enum_field("status", &request.status)?,
        is_public: request.is_public.unwrap_or(true),
        notify_subscribers: request.notify_subscribers.unwrap_or(true),
    };

    let posted = incident::post_incident_update(&state, incident_id, &auth_user.0, input).await?;

    let Json(body) = ApiResponse::with_message(
        "Incident update created successfully",
        serde_json::json!({
            "update": posted.update,
            "incident": posted.incident,
            "newlyResolved": posted.newly_resolved,
        }),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

async fn list_incident_updates(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(incident_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let found = incident::find_incident(&state.db, incident_id).await?;
    resolve_org_access(&state.db, &auth_user.0, found.organization_id).await?;

    let updates = incident::list_updates(&state.db, incident_id).await?;

    Ok(ApiResponse::new(serde_json::json!({ "updates": updates })))
}

/// Merged feed of incidents and service status changes, grouped by day.
async fn get_timeline(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(organization_id): Path<Uuid>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    resolve_org_access(&state.db, &auth_user.0, organization_id).await?;

    let query = TimelineQuery {
        limit: params.limit,
        kind: match params.kind.as_deref() {
            None => None,
            Some("incident") => Some(timeline::TimelineKindFilter::Incident),
            Some("maintenance") => Some(timeline::TimelineKindFilter::Maintenance),
            Some("service_change") => Some(timeline::TimelineKindFilter::ServiceChange),
            Some(other) => {
                return Err(crate::error::AppError::validation(
                    "type",
                    format!("Invalid value: {}", other),
                ))
            }
        },
        status: match &params.status {
            Some(raw) => Some(parse_enum_field("status", raw)?),
            None => None,
        },
        search: params.search,
    };

    let items = timeline::get_timeline(&state.db, organization_id, &query).await?;
    let days = timeline::group_by_day(items.clone());

    Ok(ApiResponse::new(serde_json::json!({
        "timelineItems": items,
        "days": days,
    })))
}
