//! Incident lifecycle: creation, ordered updates, resolution, deletion.
//!
//! Status may move freely between investigating/identified/monitoring via
//! updates; "resolved" is effectively terminal in that `resolved_at` is set
//! once and never reset, even when further updates are posted.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{incident, incident_service, incident_update, organization, service, user};
use crate::services::realtime::{OutboundEvent, Topic};
use crate::services::status::{IncidentKind, IncidentSeverity, IncidentStatus};
use crate::state::{AppState, DbConn};

pub struct NewIncident {
    pub title: String,
    pub description: Option<String>,
    pub status: IncidentStatus,
    pub severity: IncidentSeverity,
    pub kind: IncidentKind,
    pub service_ids: Vec<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub scheduled_until: Option<DateTime<Utc>>,
    pub is_public: bool,
    pub notify_subscribers: bool,
}

pub struct NewIncidentUpdate {
    pub title: String,
    pub description: String,
    pub status: IncidentStatus,
    pub is_public: bool,
    pub notify_subscribers: bool,
}

/// Partial patch for an incident. `service_ids`, when present, replaces the
/// whole affected-services set.
#[derive(Default)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<IncidentStatus>,
    pub severity: Option<IncidentSeverity>,
    pub service_ids: Option<Vec<Uuid>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub scheduled_until: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub notify_subscribers: Option<bool>,
}

#[derive(Debug)]
pub struct PostedUpdate {
    pub update: incident_update::Model,
    pub incident: incident::Model,
    pub newly_resolved: bool,
}

/// Verify every id in `service_ids` names a service of `organization_id`;
/// the error lists the offending ids.
async fn validate_service_ownership(
    db: &DbConn,
    organization_id: Uuid,
    service_ids: &[Uuid],
) -> Result<()> {
    if service_ids.is_empty() {
        return Err(AppError::validation(
            "service_ids",
            "An incident must affect at least one service",
        ));
    }

    let owned: Vec<Uuid> = Service::find()
        .filter(service::Column::Id.is_in(service_ids.iter().copied()))
        .filter(service::Column::OrganizationId.eq(organization_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let missing: Vec<String> = service_ids
        .iter()
        .filter(|id| !owned.contains(id))
        .map(|id| id.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::validation(
            "service_ids",
            format!(
                "Services do not belong to this organization: {}",
                missing.join(", ")
            ),
        ));
    }

    Ok(())
}

/// Create an incident with its service associations and an implicit first
/// update, all in one transaction, then notify subscribers.
pub async fn create_incident(
    state: &AppState,
    org: &organization::Model,
    actor: &user::Model,
    input: NewIncident,
) -> Result<incident::Model> {
    validate_service_ownership(&state.db, org.id, &input.service_ids).await?;

    let now = Utc::now();
    let incident_id = Uuid::new_v4();

    let txn = state.db.begin().await?;

    let row = incident::ActiveModel {
        id: Set(incident_id),
        title: Set(input.title.clone()),
        description: Set(input.description.clone()),
        status: Set(input.status.as_str().to_string()),
        severity: Set(input.severity.as_str().to_string()),
        kind: Set(input.kind.as_str().to_string()),
        organization_id: Set(org.id),
        created_by: Set(actor.id),
        started_at: Set(now),
        resolved_at: Set(None),
        scheduled_for: Set(input.scheduled_for),
        scheduled_until: Set(input.scheduled_until),
        is_public: Set(input.is_public),
        notify_subscribers: Set(input.notify_subscribers),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = row.insert(&txn).await?;

    let mut seen = Vec::new();
    for service_id in &input.service_ids {
        if seen.contains(service_id) {
            continue;
        }
        seen.push(*service_id);
        let link = incident_service::ActiveModel {
            incident_id: Set(incident_id),
            service_id: Set(*service_id),
        };
        link.insert(&txn).await?;
    }

    // The timeline always has at least one update entry per incident.
    let first_update = incident_update::ActiveModel {
        id: Set(Uuid::new_v4()),
        incident_id: Set(incident_id),
        title: Set(format!("Incident Created: {}", created.title)),
        description: Set(created
            .description
            .clone()
            .unwrap_or_else(|| "Initial incident report.".to_string())),
        status: Set(created.status.clone()),
        created_by: Set(actor.id),
        is_public: Set(created.is_public),
        notify_subscribers: Set(created.notify_subscribers),
        created_at: Set(now),
    };
    first_update.insert(&txn).await?;

    txn.commit().await?;

    let event = OutboundEvent::incident_created(created.id, &created.title, org.id);
    state.realtime.publish(&Topic::Organization(org.id), &event);
    if created.is_public && org.is_public {
        state
            .realtime
            .publish(&Topic::StatusPage(org.slug.clone()), &event);
    }

    Ok(created)
}

/// Append an update and sync the parent incident's status to it.
///
/// Resolution is idempotent: the first update carrying "resolved" stamps
/// `resolved_at`; later resolved updates leave the stamp untouched.
pub async fn post_incident_update(
    state: &AppState,
    incident_id: Uuid,
    actor: &user::Model,
    input: NewIncidentUpdate,
) -> Result<PostedUpdate> {
    let _guard = state.incident_locks.acquire(incident_id).await;

    let existing = Incident::find_by_id(incident_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

    let now = Utc::now();
    let newly_resolved = input.status == IncidentStatus::Resolved && existing.resolved_at.is_none();

    let txn = state.db.begin().await?;

    let update_row = incident_update::ActiveModel {
        id: Set(Uuid::new_v4()),
        incident_id: Set(incident_id),
        title: Set(input.title),
        description: Set(input.description),
        status: Set(input.status.as_str().to_string()),
        created_by: Set(actor.id),
        is_public: Set(input.is_public),
        notify_subscribers: Set(input.notify_subscribers),
        created_at: Set(now),
    };
    let update = update_row.insert(&txn).await?;

    let incident = if existing.status != input.status.as_str() || newly_resolved {
        let mut active: incident::ActiveModel = existing.into();
        active.status = Set(input.status.as_str().to_string());
        if newly_resolved {
            active.resolved_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        active.update(&txn).await?
    } else {
        existing
    };

    txn.commit().await?;

    notify_incident_updated(state, &incident, newly_resolved).await?;

    Ok(PostedUpdate {
        update,
        incident,
        newly_resolved,
    })
}

/// Apply a partial patch. When `service_ids` is present the association set
/// is rewritten wholesale (remove-all-then-insert); the per-incident lock
/// makes that safe against concurrent edits of the same incident.
pub async fn update_incident(
    state: &AppState,
    incident_id: Uuid,
    patch: IncidentPatch,
) -> Result<incident::Model> {
    let _guard = state.incident_locks.acquire(incident_id).await;

    let existing = Incident::find_by_id(incident_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

    if let Some(service_ids) = &patch.service_ids {
        validate_service_ownership(&state.db, existing.organization_id, service_ids).await?;
    }

    let now = Utc::now();
    let newly_resolved = patch.status == Some(IncidentStatus::Resolved)
        && existing.resolved_at.is_none();

    let txn = state.db.begin().await?;

    let mut active: incident::ActiveModel = existing.into();
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(description) = patch.description {
        active.description = Set(Some(description));
    }
    if let Some(status) = patch.status {
        active.status = Set(status.as_str().to_string());
        if newly_resolved {
            active.resolved_at = Set(Some(now));
        }
    }
    if let Some(severity) = patch.severity {
        active.severity = Set(severity.as_str().to_string());
    }
    if let Some(scheduled_for) = patch.scheduled_for {
        active.scheduled_for = Set(Some(scheduled_for));
    }
    if let Some(scheduled_until) = patch.scheduled_until {
        active.scheduled_until = Set(Some(scheduled_until));
    }
    if let Some(is_public) = patch.is_public {
        active.is_public = Set(is_public);
    }
    if let Some(notify_subscribers) = patch.notify_subscribers {
        active.notify_subscribers = Set(notify_subscribers);
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    if let Some(service_ids) = patch.service_ids {
        IncidentService::delete_many()
            .filter(incident_service::Column::IncidentId.eq(incident_id))
            .exec(&txn)
            .await?;
        let mut seen = Vec::new();
        for service_id in service_ids {
            if seen.contains(&service_id) {
                continue;
            }
            seen.push(service_id);
            let link = incident_service::ActiveModel {
                incident_id: Set(incident_id),
                service_id: Set(service_id),
            };
            link.insert(&txn).await?;
        }
    }

    txn.commit().await?;

    notify_incident_updated(state, &updated, newly_resolved).await?;

    Ok(updated)
}

/// Hard delete with explicit cascades to updates and associations.
pub async fn delete_incident(state: &AppState, incident_id: Uuid) -> Result<()> {
    let existing = Incident::find_by_id(incident_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

    let txn = state.db.begin().await?;

    IncidentUpdate::delete_many()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .exec(&txn)
        .await?;
    IncidentService::delete_many()
        .filter(incident_service::Column::IncidentId.eq(incident_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Fetch an incident or fail with NotFound.
pub async fn find_incident(db: &DbConn, incident_id: Uuid) -> Result<incident::Model> {
    Incident::find_by_id(incident_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))
}

/// Services currently associated with an incident.
pub async fn affected_services(db: &DbConn, incident: &incident::Model) -> Result<Vec<service::Model>> {
    let services = incident
        .find_related(Service)
        .order_by_asc(service::Column::Name)
        .all(db)
        .await?;
    Ok(services)
}

/// Updates for display, oldest first.
pub async fn list_updates(db: &DbConn, incident_id: Uuid) -> Result<Vec<incident_update::Model>> {
    let updates = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .order_by_asc(incident_update::Column::CreatedAt)
        .all(db)
        .await?;
    Ok(updates)
}

/// The most recent update, if any.
pub async fn latest_update(db: &DbConn, incident_id: Uuid) -> Result<Option<incident_update::Model>> {
    let update = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.eq(incident_id))
        .order_by_desc(incident_update::Column::CreatedAt)
        .one(db)
        .await?;
    Ok(update)
}

pub struct IncidentPage {
    pub incidents: Vec<incident::Model>,
    pub total: u64,
}

/// Paginated incident listing for one organization, newest started first.
pub async fn list_incidents(
    db: &DbConn,
    organization_id: Uuid,
    statuses: Option<Vec<IncidentStatus>>,
    kind: Option<IncidentKind>,
    page: u64,
    limit: u64,
) -> Result<IncidentPage> {
    let mut select = Incident::find()
        .filter(incident::Column::OrganizationId.eq(organization_id));

    if let Some(statuses) = statuses {
        let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        select = select.filter(incident::Column::Status.is_in(values));
    }
    if let Some(kind) = kind {
        select = select.filter(incident::Column::Kind.eq(kind.as_str()));
    }

    let total = select.clone().count(db).await?;

    let incidents = select
        .order_by_desc(incident::Column::StartedAt)
        .offset(page.saturating_sub(1) * limit)
        .limit(limit)
        .all(db)
        .await?;

    Ok(IncidentPage { incidents, total })
}

async fn notify_incident_updated(
    state: &AppState,
    incident: &incident::Model,
    newly_resolved: bool,
) -> Result<()> {
    let org = Organization::find_by_id(incident.organization_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let event = OutboundEvent::incident_updated(
        incident.id,
        &incident.title,
        &incident.status,
        newly_resolved,
    );
    state.realtime.publish(&Topic::Organization(org.id), &event);
    if incident.is_public && org.is_public {
        state
            .realtime
            .publish(&Topic::StatusPage(org.slug.clone()), &event);
    }
    Ok(())
}
