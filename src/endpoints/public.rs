//! Public, unauthenticated status-page projections.
//!
//! Only public organizations, services, incidents and updates are visible
//! here; internal error detail never leaks through this surface.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use uuid::Uuid;

use crate::endpoints::ApiResponse;
use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{incident, incident_service, incident_update, organization, service};
use crate::services::status::derive_overall_status;
use crate::state::AppState;

/// Create public routes
pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/status/{slug}", get(get_status_page))
        .route("/status/{slug}/summary", get(get_summary))
        .route("/status/{slug}/incidents", get(list_public_incidents))
        .route(
            "/status/{slug}/incidents/{incident_id}",
            get(get_public_incident),
        )
        .route(
            "/status/{slug}/services/{service_id}/uptime",
            get(get_service_uptime),
        )
        .with_state(state)
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn find_public_org(state: &AppState, slug: &str) -> Result<organization::Model> {
    Organization::find()
        .filter(organization::Column::Slug.eq(slug))
        .filter(organization::Column::IsPublic.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Status page not found".to_string()))
}

/// Public service refs for a set of incidents, keyed per incident.
async fn affected_service_refs(
    state: &AppState,
    incident_ids: &[Uuid],
) -> Result<Vec<(Uuid, serde_json::Value)>> {
    if incident_ids.is_empty() {
        return Ok(Vec::new());
    }
    let links = IncidentService::find()
        .filter(incident_service::Column::IncidentId.is_in(incident_ids.iter().copied()))
        .all(&state.db)
        .await?;
    let service_ids: Vec<Uuid> = links.iter().map(|l| l.service_id).collect();
    let services = Service::find()
        .filter(service::Column::Id.is_in(service_ids))
        .all(&state.db)
        .await?;

    Ok(links
        .into_iter()
        .filter_map(|link| {
            services
                .iter()
                .find(|s| s.id == link.service_id)
                .map(|s| {
                    (
                        link.incident_id,
                        serde_json::json!({ "id": s.id, "name": s.name }),
                    )
                })
        })
        .collect())
}

fn public_incident_json(
    row: &incident::Model,
    affected: &[(Uuid, serde_json::Value)],
    latest_update: Option<&incident_update::Model>,
) -> serde_json::Value {
    serde_json::json!({
        "id": row.id,
        "title": row.title,
        "description": row.description,
        "status": row.status,
        "severity": row.severity,
        "type": row.kind,
        "startedAt": row.started_at,
        "resolvedAt": row.resolved_at,
        "scheduledFor": row.scheduled_for,
        "scheduledUntil": row.scheduled_until,
        "affectedServices": affected
            .iter()
            .filter(|(id, _)| *id == row.id)
            .map(|(_, s)| s.clone())
            .collect::<Vec<_>>(),
        "latestUpdate": latest_update,
    })
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Full public status page payload: organization profile, public services,
/// active public incidents, upcoming maintenance and the derived overall
/// status.
async fn get_status_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let org = find_public_org(&state, &slug).await?;

    let services = Service::find()
        .filter(service::Column::OrganizationId.eq(org.id))
        .filter(service::Column::IsPublic.eq(true))
        .order_by_asc(service::Column::SortOrder)
        .order_by_asc(service::Column::Name)
        .all(&state.db)
        .await?;

    let active_incidents = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Status.ne("resolved"))
        .filter(incident::Column::IsPublic.eq(true))
        .order_by_desc(incident::Column::StartedAt)
        .all(&state.db)
        .await?;

    let scheduled_maintenance = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Kind.eq("maintenance"))
        .filter(incident::Column::ScheduledFor.gte(Utc::now()))
        .filter(incident::Column::IsPublic.eq(true))
        .order_by_asc(incident::Column::ScheduledFor)
        .limit(5)
        .all(&state.db)
        .await?;

    // Overall status derives from public services only; the page must not
    // reveal the health of hidden services.
    let overall = derive_overall_status(services.iter().map(|s| s.status.as_str()));
    if !overall.unknown.is_empty() {
        tracing::warn!(
            organization = %org.slug,
            values = ?overall.unknown,
            "public services carry unknown status values"
        );
    }

    let active_ids: Vec<Uuid> = active_incidents.iter().map(|i| i.id).collect();
    let affected = affected_service_refs(&state, &active_ids).await?;

    let mut latest_updates = Vec::new();
    for row in &active_incidents {
        let latest = IncidentUpdate::find()
            .filter(incident_update::Column::IncidentId.eq(row.id))
            .filter(incident_update::Column::IsPublic.eq(true))
            .order_by_desc(incident_update::Column::CreatedAt)
            .one(&state.db)
            .await?;
        latest_updates.push(latest);
    }

    let maintenance_ids: Vec<Uuid> = scheduled_maintenance.iter().map(|i| i.id).collect();
    let maintenance_affected = affected_service_refs(&state, &maintenance_ids).await?;

    Ok(ApiResponse::new(serde_json::json!({
        "organization": {
            "id": org.id,
            "name": org.name,
            "slug": org.slug,
            "description": org.description,
            "logoUrl": org.logo_url,
            "websiteUrl": org.website_url,
            "primaryColor": org.primary_color,
            "timezone": org.timezone,
        },
        "services": services,
        "activeIncidents": active_incidents
            .iter()
            .zip(latest_updates.iter())
            .map(|(row, latest)| public_incident_json(row, &affected, latest.as_ref()))
            .collect::<Vec<_>>(),
        "scheduledMaintenance": scheduled_maintenance
            .iter()
            .map(|row| public_incident_json(row, &maintenance_affected, None))
            .collect::<Vec<_>>(),
        "overallStatus": overall.status.as_str(),
    })))
}

#[derive(Debug, Deserialize)]
struct PublicIncidentsParams {
    page: Option<u64>,
    limit: Option<u64>,
}

/// Public incidents from the last 30 days, newest first, paginated.
async fn list_public_incidents(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PublicIncidentsParams>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let org = find_public_org(&state, &slug).await?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let thirty_days_ago = Utc::now() - Duration::days(30);

    let select = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::StartedAt.gte(thirty_days_ago))
        .filter(incident::Column::IsPublic.eq(true));

    let total = select.clone().count(&state.db).await?;

    let incidents = select
        .order_by_desc(incident::Column::StartedAt)
        .offset((page - 1) * limit)
        .limit(limit)
        .all(&state.db)
        .await?;

    let ids: Vec<Uuid> = incidents.iter().map(|i| i.id).collect();
    let affected = affected_service_refs(&state, &ids).await?;

    Ok(ApiResponse::new(serde_json::json!({
        "incidents": incidents
            .iter()
            .map(|row| public_incident_json(row, &affected, None))
            .collect::<Vec<_>>(),
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": total.div_ceil(limit),
        },
    })))
}

/// Public incident detail with its public updates, oldest first.
async fn get_public_incident(
    State(state): State<AppState>,
    Path((slug, incident_id)): Path<(String, Uuid)>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let org = find_public_org(&state, &slug).await?;

    let found = Incident::find_by_id(incident_id)
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::IsPublic.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

    let updates = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(found.id))
        .filter(incident_update::Column::IsPublic.eq(true))
        .order_by_asc(incident_update::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let affected = affected_service_refs(&state, &[found.id]).await?;

    Ok(ApiResponse::new(serde_json::json!({
        "incident": public_incident_json(&found, &affected, None),
        "updates": updates,
        "organization": { "id": org.id, "name": org.name },
    })))
}

#[derive(Debug, Deserialize)]
struct UptimeParams {
    days: Option<i64>,
}

/// Operator uptime value plus a generated daily series. The series is
/// synthetic; uptime here is operator-entered, not measured.
async fn get_service_uptime(
    State(state): State<AppState>,
    Path((slug, service_id)): Path<(String, Uuid)>,
    Query(params): Query<UptimeParams>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let org = find_public_org(&state, &slug).await?;

    let svc = Service::find_by_id(service_id)
        .filter(service::Column::OrganizationId.eq(org.id))
        .filter(service::Column::IsPublic.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let days = params.days.unwrap_or(30).clamp(1, 90);
    let start = Utc::now() - Duration::days(days);

    let mut rng = rand::rng();
    let mut uptime_data = Vec::with_capacity(days as usize);
    let mut total = 0.0;
    for offset in 0..days {
        let date = start + Duration::days(offset);
        let uptime: f64 = if rng.random_bool(0.9) {
            100.0
        } else {
            rng.random_range(0.0..100.0)
        };
        let uptime = (uptime * 100.0).round() / 100.0;
        total += uptime;
        uptime_data.push(serde_json::json!({
            "date": date.date_naive().to_string(),
            "uptime": uptime,
        }));
    }

    Ok(ApiResponse::new(serde_json::json!({
        "service": {
            "id": svc.id,
            "name": svc.name,
            "status": svc.status,
            "uptimePercentage": svc.uptime_percentage,
        },
        "uptimeData": uptime_data,
        "averageUptime": total / days as f64,
    })))
}

/// Counts-only summary for lightweight polling.
async fn get_summary(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let org = find_public_org(&state, &slug).await?;

    let service_count = Service::find()
        .filter(service::Column::OrganizationId.eq(org.id))
        .filter(service::Column::IsPublic.eq(true))
        .count(&state.db)
        .await?;

    let active_incident_count = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Status.ne("resolved"))
        .filter(incident::Column::IsPublic.eq(true))
        .count(&state.db)
        .await?;

    let scheduled_maintenance_count = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::Kind.eq("maintenance"))
        .filter(incident::Column::ScheduledFor.gte(Utc::now()))
        .filter(incident::Column::IsPublic.eq(true))
        .count(&state.db)
        .await?;

    let seven_days_ago = Utc::now() - Duration::days(7);
    let recent_incident_count = Incident::find()
        .filter(incident::Column::OrganizationId.eq(org.id))
        .filter(incident::Column::StartedAt.gte(seven_days_ago))
        .filter(incident::Column::IsPublic.eq(true))
        .count(&state.db)
        .await?;

    Ok(ApiResponse::new(serde_json::json!({
        "organization": { "id": org.id, "name": org.name, "description": org.description },
        "summary": {
            "serviceCount": service_count,
            "activeIncidentCount": active_incident_count,
            "scheduledMaintenanceCount": scheduled_maintenance_count,
            "recentIncidentCount": recent_incident_count,
        },
    })))
}
