//! Tests for the incident lifecycle.
//!
//! Covers:
//! - creation: associations, implicit first update, validation, no partial
//!   writes on rejection
//! - updates: append-only log, status sync, idempotent resolution
//! - patching: field updates, replace-all association rewrite, resolved_at
//!   never reset
//! - deletion cascades and listing filters

mod common;
use common::{
    create_test_org, create_test_service, create_test_state, create_test_user,
};

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use statusdeck::error::AppError;
use statusdeck::models::prelude::*;
use statusdeck::models::incident_service;
use statusdeck::services::incident::{
    affected_services, create_incident, delete_incident, list_incidents, list_updates,
    post_incident_update, update_incident, IncidentPatch, NewIncident, NewIncidentUpdate,
};
use statusdeck::services::status::{IncidentKind, IncidentSeverity, IncidentStatus};
use uuid::Uuid;

fn new_incident(service_ids: Vec<Uuid>) -> NewIncident {
    NewIncident {
        title: "API outage".to_string(),
        description: Some("Requests are failing".to_string()),
        status: IncidentStatus::Investigating,
        severity: IncidentSeverity::Major,
        kind: IncidentKind::Incident,
        service_ids,
        scheduled_for: None,
        scheduled_until: None,
        is_public: true,
        notify_subscribers: true,
    }
}

fn new_update(status: IncidentStatus) -> NewIncidentUpdate {
    NewIncidentUpdate {
        title: "Status update".to_string(),
        description: "Progress report".to_string(),
        status,
        is_public: true,
        notify_subscribers: true,
    }
}

#[tokio::test]
async fn create_incident_persists_associations_and_first_update() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let web = create_test_service(&state.db, org.id, "Website", "operational").await;

    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id, web.id]))
        .await
        .unwrap();

    assert_eq!(created.status, "investigating");
    assert_eq!(created.severity, "major");
    assert!(created.resolved_at.is_none());

    let affected = affected_services(&state.db, &created).await.unwrap();
    assert_eq!(affected.len(), 2);

    let updates = list_updates(&state.db, created.id).await.unwrap();
    assert_eq!(updates.len(), 1, "every incident starts with one update");
    assert_eq!(updates[0].title, "Incident Created: API outage");
    assert_eq!(updates[0].status, "investigating");
}

#[tokio::test]
async fn create_incident_rejects_empty_service_set() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;

    let err = create_incident(&state, &org, &admin, new_incident(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    assert_eq!(Incident::find().count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn create_incident_rejects_foreign_services_without_partial_writes() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let other_owner = create_test_user(&state.db, "other@example.com", "password123", "admin").await;
    let other_org = create_test_org(&state.db, other_owner.id, "Rival", "rival", "7654321").await;

    let mine = create_test_service(&state.db, org.id, "API", "operational").await;
    let foreign = create_test_service(&state.db, other_org.id, "Billing", "operational").await;

    let err = create_incident(
        &state,
        &org,
        &admin,
        new_incident(vec![mine.id, foreign.id]),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Validation { errors, .. } => {
            assert_eq!(errors[0].field, "service_ids");
            assert!(
                errors[0].message.contains(&foreign.id.to_string()),
                "error must name the offending id"
            );
        }
        other => panic!("expected validation error, got {:?}", other.to_string()),
    }

    // Rejection happens before any write: nothing persisted.
    assert_eq!(Incident::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(IncidentService::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(IncidentUpdate::find().count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn post_update_appends_and_syncs_status() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();

    let posted = post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Identified),
    )
    .await
    .unwrap();

    assert_eq!(posted.update.status, "identified");
    assert_eq!(posted.incident.status, "identified");
    assert!(!posted.newly_resolved);
    assert!(posted.incident.resolved_at.is_none());

    let updates = list_updates(&state.db, created.id).await.unwrap();
    assert_eq!(updates.len(), 2, "updates are append-only");
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();

    let first = post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Resolved),
    )
    .await
    .unwrap();
    assert!(first.newly_resolved);
    let resolved_at = first.incident.resolved_at.expect("resolved_at must be set");

    // Posting resolved again still appends an update but must not touch the
    // original resolution timestamp.
    let second = post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Resolved),
    )
    .await
    .unwrap();
    assert!(!second.newly_resolved);
    assert_eq!(second.incident.resolved_at, Some(resolved_at));

    let updates = list_updates(&state.db, created.id).await.unwrap();
    assert_eq!(updates.len(), 3);
}

#[tokio::test]
async fn updates_after_resolution_are_not_rejected() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();

    post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Resolved),
    )
    .await
    .unwrap();
    let resolved_at = Incident::find_by_id(created.id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap()
        .resolved_at
        .unwrap();

    // A post-mortem style update moves status but keeps the stamp.
    let posted = post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Monitoring),
    )
    .await
    .unwrap();
    assert_eq!(posted.incident.status, "monitoring");
    assert_eq!(posted.incident.resolved_at, Some(resolved_at));
}

#[tokio::test]
async fn patch_replaces_association_set() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let web = create_test_service(&state.db, org.id, "Website", "operational").await;
    let db_svc = create_test_service(&state.db, org.id, "Database", "operational").await;

    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id, web.id]))
        .await
        .unwrap();

    let patched = update_incident(
        &state,
        created.id,
        IncidentPatch {
            title: Some("Database outage".to_string()),
            severity: Some(IncidentSeverity::Critical),
            service_ids: Some(vec![db_svc.id]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(patched.title, "Database outage");
    assert_eq!(patched.severity, "critical");

    // Remove-all-then-insert: only the new set remains.
    let links = IncidentService::find()
        .filter(incident_service::Column::IncidentId.eq(created.id))
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].service_id, db_svc.id);
}

#[tokio::test]
async fn patch_rejects_foreign_service_ids() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let other_owner = create_test_user(&state.db, "other@example.com", "password123", "admin").await;
    let other_org = create_test_org(&state.db, other_owner.id, "Rival", "rival", "7654321").await;
    let foreign = create_test_service(&state.db, other_org.id, "Billing", "operational").await;

    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();

    let err = update_incident(
        &state,
        created.id,
        IncidentPatch {
            service_ids: Some(vec![foreign.id]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    // The original association survives the rejected patch.
    let affected = affected_services(
        &state.db,
        &Incident::find_by_id(created.id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(affected.len(), 1);
    assert_eq!(affected[0].id, api.id);
}

#[tokio::test]
async fn patch_to_resolved_sets_timestamp_once() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();

    let resolved = update_incident(
        &state,
        created.id,
        IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let stamp = resolved.resolved_at.expect("resolved_at set by patch");

    let again = update_incident(
        &state,
        created.id,
        IncidentPatch {
            status: Some(IncidentStatus::Resolved),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(again.resolved_at, Some(stamp), "resolved_at never resets");
}

#[tokio::test]
async fn delete_incident_cascades() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;
    let created = create_incident(&state, &org, &admin, new_incident(vec![api.id]))
        .await
        .unwrap();
    post_incident_update(
        &state,
        created.id,
        &admin,
        new_update(IncidentStatus::Monitoring),
    )
    .await
    .unwrap();

    delete_incident(&state, created.id).await.unwrap();

    assert_eq!(Incident::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(IncidentUpdate::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(IncidentService::find().count(&state.db).await.unwrap(), 0);

    // The service itself is untouched by the cascade.
    assert_eq!(Service::find().count(&state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn missing_incident_is_not_found() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;

    let err = post_incident_update(
        &state,
        Uuid::new_v4(),
        &admin,
        new_update(IncidentStatus::Monitoring),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = delete_incident(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn list_incidents_filters_and_paginates() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let api = create_test_service(&state.db, org.id, "API", "operational").await;

    for (title, kind) in [
        ("Outage one", IncidentKind::Incident),
        ("Outage two", IncidentKind::Incident),
        ("Planned upgrade", IncidentKind::Maintenance),
    ] {
        let mut input = new_incident(vec![api.id]);
        input.title = title.to_string();
        input.kind = kind;
        create_incident(&state, &org, &admin, input).await.unwrap();
    }

    let all = list_incidents(&state.db, org.id, None, None, 1, 20)
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let maintenance = list_incidents(&state.db, org.id, None, Some(IncidentKind::Maintenance), 1, 20)
        .await
        .unwrap();
    assert_eq!(maintenance.total, 1);
    assert_eq!(maintenance.incidents[0].title, "Planned upgrade");

    let investigating = list_incidents(
        &state.db,
        org.id,
        Some(vec![IncidentStatus::Investigating]),
        None,
        1,
        20,
    )
    .await
    .unwrap();
    assert_eq!(investigating.total, 3);

    let page = list_incidents(&state.db, org.id, None, None, 2, 2)
        .await
        .unwrap();
    assert_eq!(page.incidents.len(), 1);
}
