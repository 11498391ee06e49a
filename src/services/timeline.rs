//! Organization timeline: incidents and service status changes merged into
//! one chronologically ordered feed.
//!
//! The merge is two-phase: fetch the most recent N of each source, tag,
//! concatenate, sort by timestamp descending, truncate. When both sources
//! hold close to N recent rows the global "most recent N" is approximate;
//! callers needing strict completeness should raise `limit`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::prelude::*;
use crate::models::{incident, incident_service, incident_update, service, service_status_log, user};
use crate::services::status::IncidentStatus;
use crate::state::DbConn;

pub const DEFAULT_TIMELINE_LIMIT: u64 = 50;

/// Post-merge type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKindFilter {
    Incident,
    Maintenance,
    ServiceChange,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineQuery {
    pub limit: Option<u64>,
    pub kind: Option<TimelineKindFilter>,
    pub status: Option<IncidentStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ServiceRef {
    pub id: Uuid,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineIncident {
    #[serde(flatten)]
    pub incident: incident::Model,
    pub affected_services: Vec<ServiceRef>,
    pub latest_update: Option<incident_update::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineStatusChange {
    #[serde(flatten)]
    pub change: service_status_log::Model,
    pub service_name: String,
    pub changed_by_name: Option<String>,
}

/// One feed entry; the `kind` tag distinguishes the two sources.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineItem {
    Incident {
        timestamp: DateTime<Utc>,
        incident: TimelineIncident,
    },
    ServiceStatusChange {
        timestamp: DateTime<Utc>,
        change: TimelineStatusChange,
    },
}

impl TimelineItem {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TimelineItem::Incident { timestamp, .. } => *timestamp,
            TimelineItem::ServiceStatusChange { timestamp, .. } => *timestamp,
        }
    }
}

/// Items of one UTC calendar day, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub items: Vec<TimelineItem>,
}

/// Build the merged feed for one organization.
pub async fn get_timeline(
    db: &DbConn,
    organization_id: Uuid,
    query: &TimelineQuery,
) -> Result<Vec<TimelineItem>> {
    let limit = query.limit.unwrap_or(DEFAULT_TIMELINE_LIMIT).max(1);

    let incidents = fetch_recent_incidents(db, organization_id, limit).await?;
    let changes = fetch_recent_changes(db, organization_id, limit).await?;

    let mut items: Vec<TimelineItem> = Vec::with_capacity(incidents.len() + changes.len());
    items.extend(incidents.into_iter().map(|incident| TimelineItem::Incident {
        timestamp: incident.incident.started_at,
        incident,
    }));
    items.extend(
        changes
            .into_iter()
            .map(|change| TimelineItem::ServiceStatusChange {
                timestamp: change.change.created_at,
                change,
            }),
    );

    items.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    items.truncate(limit as usize);

    // Filters apply after the merge: kind, then incident status, then search.
    if let Some(kind) = query.kind {
        items.retain(|item| match (kind, item) {
            (TimelineKindFilter::ServiceChange, TimelineItem::ServiceStatusChange { .. }) => true,
            (TimelineKindFilter::Incident, TimelineItem::Incident { incident, .. }) => {
                incident.incident.kind == "incident"
            }
            (TimelineKindFilter::Maintenance, TimelineItem::Incident { incident, .. }) => {
                incident.incident.kind == "maintenance"
            }
            _ => false,
        });
    }

    if let Some(status) = query.status {
        items.retain(|item| match item {
            TimelineItem::Incident { incident, .. } => incident.incident.status == status.as_str(),
            // Status filtering only constrains incidents.
            TimelineItem::ServiceStatusChange { .. } => true,
        });
    }

    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        items.retain(|item| match item {
            TimelineItem::Incident { incident, .. } => {
                incident.incident.title.to_lowercase().contains(&needle)
                    || incident
                        .incident
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            }
            TimelineItem::ServiceStatusChange { change, .. } => {
                change.service_name.to_lowercase().contains(&needle)
            }
        });
    }

    Ok(items)
}

/// Group a merged feed by UTC calendar date, preserving newest-first order
/// inside each group.
pub fn group_by_day(items: Vec<TimelineItem>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for item in items {
        let date = item.timestamp().date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.items.push(item),
            _ => groups.push(DayGroup {
                date,
                items: vec![item],
            }),
        }
    }
    groups
}

async fn fetch_recent_incidents(
    db: &DbConn,
    organization_id: Uuid,
    limit: u64,
) -> Result<Vec<TimelineIncident>> {
    let incidents = Incident::find()
        .filter(incident::Column::OrganizationId.eq(organization_id))
        .order_by_desc(incident::Column::StartedAt)
        .limit(limit)
        .all(db)
        .await?;

    if incidents.is_empty() {
        return Ok(Vec::new());
    }

    let incident_ids: Vec<Uuid> = incidents.iter().map(|i| i.id).collect();

    let links = IncidentService::find()
        .filter(incident_service::Column::IncidentId.is_in(incident_ids.clone()))
        .all(db)
        .await?;
    let service_ids: Vec<Uuid> = links.iter().map(|l| l.service_id).collect();
    let services: HashMap<Uuid, service::Model> = Service::find()
        .filter(service::Column::Id.is_in(service_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let updates = IncidentUpdate::find()
        .filter(incident_update::Column::IncidentId.is_in(incident_ids))
        .order_by_desc(incident_update::Column::CreatedAt)
        .all(db)
        .await?;
    let mut latest_by_incident: HashMap<Uuid, incident_update::Model> = HashMap::new();
    for update in updates {
        latest_by_incident
            .entry(update.incident_id)
            .or_insert(update);
    }

    Ok(incidents
        .into_iter()
        .map(|row| {
            let affected = links
                .iter()
                .filter(|l| l.incident_id == row.id)
                .filter_map(|l| services.get(&l.service_id))
                .map(|s| ServiceRef {
                    id: s.id,
                    name: s.name.clone(),
                    status: s.status.clone(),
                })
                .collect();
            TimelineIncident {
                latest_update: latest_by_incident.remove(&row.id),
                affected_services: affected,
                incident: row,
            }
        })
        .collect())
}

async fn fetch_recent_changes(
    db: &DbConn,
    organization_id: Uuid,
    limit: u64,
) -> Result<Vec<TimelineStatusChange>> {
    let changes = ServiceStatusLog::find()
        .filter(service_status_log::Column::OrganizationId.eq(organization_id))
        .order_by_desc(service_status_log::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?;

    if changes.is_empty() {
        return Ok(Vec::new());
    }

    let service_ids: Vec<Uuid> = changes.iter().map(|c| c.service_id).collect();
    let service_names: HashMap<Uuid, String> = Service::find()
        .filter(service::Column::Id.is_in(service_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let user_ids: Vec<Uuid> = changes.iter().map(|c| c.changed_by).collect();
    let user_names: HashMap<Uuid, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    Ok(changes
        .into_iter()
        .map(|row| TimelineStatusChange {
            service_name: service_names
                .get(&row.service_id)
                .cloned()
                .unwrap_or_default(),
            changed_by_name: user_names.get(&row.changed_by).cloned(),
            change: row,
        })
        .collect())
}
