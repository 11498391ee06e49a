//! Service status mutation and its append-only audit trail.
//!
//! A status change and its log entry commit in one transaction, serialized
//! per service by a keyed lock so the log forms an unbroken old->new chain.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::{service, service_status_log, user};
use crate::services::realtime::{OutboundEvent, Topic};
use crate::services::status::{derive_overall_status, OverallStatus, ServiceStatus};
use crate::state::{AppState, DbConn};

/// Outcome of an accepted status mutation.
pub struct StatusChange {
    pub service: service::Model,
    pub log: service_status_log::Model,
    pub status_changed: bool,
    pub overall: ServiceStatus,
}

/// Append one audit row. Runs on the caller's connection so it joins the
/// caller's transaction; `old_status` is None only for a first-ever
/// assignment.
pub async fn record_status_change<C: ConnectionTrait>(
    conn: &C,
    service_id: Uuid,
    organization_id: Uuid,
    old_status: Option<String>,
    new_status: ServiceStatus,
    actor_id: Uuid,
) -> Result<service_status_log::Model> {
    let entry = service_status_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(service_id),
        organization_id: Set(organization_id),
        old_status: Set(old_status),
        new_status: Set(new_status.as_str().to_string()),
        changed_by: Set(actor_id),
        created_at: Set(Utc::now()),
    };
    Ok(entry.insert(conn).await?)
}

/// Change a service's status, audit-log the transition, recompute the
/// organization's overall status and notify subscribers.
///
/// The service row update and the log insert are atomic; the realtime
/// publishes happen after commit and are fire-and-forget.
pub async fn change_service_status(
    state: &AppState,
    service_id: Uuid,
    new_status: ServiceStatus,
    actor: &user::Model,
) -> Result<StatusChange> {
    // Serialize writers per service before reading the current status, so
    // two concurrent changes cannot both observe the same old value.
    let _guard = state.service_locks.acquire(service_id).await;

    let txn = state.db.begin().await?;

    let current = Service::find_by_id(service_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    let old_status = current.status.clone();
    let status_changed = old_status != new_status.as_str();

    let mut active: service::ActiveModel = current.into();
    active.status = Set(new_status.as_str().to_string());
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    let log = record_status_change(
        &txn,
        service_id,
        updated.organization_id,
        Some(old_status),
        new_status,
        actor.id,
    )
    .await?;

    txn.commit().await?;

    let overall = notify_service_updated(state, &updated).await?;

    Ok(StatusChange {
        service: updated,
        log,
        status_changed,
        overall,
    })
}

/// Newest-first page of an organization's status-change history.
pub async fn list_status_changes(
    db: &DbConn,
    organization_id: Uuid,
    limit: u64,
    offset: u64,
) -> Result<Vec<service_status_log::Model>> {
    let entries = ServiceStatusLog::find()
        .filter(service_status_log::Column::OrganizationId.eq(organization_id))
        .order_by_desc(service_status_log::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok(entries)
}

/// Derive the overall status across an organization's services. Unknown
/// status strings in stored rows are logged as a data-integrity warning.
pub async fn organization_overall_status(db: &DbConn, organization_id: Uuid) -> Result<OverallStatus> {
    let statuses: Vec<String> = Service::find()
        .filter(service::Column::OrganizationId.eq(organization_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.status)
        .collect();

    let overall = derive_overall_status(statuses.iter().map(String::as_str));
    if !overall.unknown.is_empty() {
        tracing::warn!(
            organization_id = %organization_id,
            values = ?overall.unknown,
            "services carry unknown status values, treating as operational"
        );
    }
    Ok(overall)
}

/// Publish `service-updated` and `status-changed` for a mutated service.
async fn notify_service_updated(state: &AppState, svc: &service::Model) -> Result<ServiceStatus> {
    let overall = organization_overall_status(&state.db, svc.organization_id).await?;

    let org = Organization::find_by_id(svc.organization_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let service_event = OutboundEvent::service_updated(svc.id, &svc.name, &svc.status);
    let status_event = OutboundEvent::status_changed(org.id, overall.status.as_str());

    let org_topic = Topic::Organization(org.id);
    state.realtime.publish(&org_topic, &service_event);
    state.realtime.publish(&org_topic, &status_event);

    if svc.is_public && org.is_public {
        let page_topic = Topic::StatusPage(org.slug.clone());
        state.realtime.publish(&page_topic, &service_event);
        state.realtime.publish(&page_topic, &status_event);
    }

    Ok(overall.status)
}
