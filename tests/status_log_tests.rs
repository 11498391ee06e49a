//! Tests for service status mutation and its audit trail.
//!
//! Covers:
//! - atomic status change + log row per accepted mutation
//! - the unbroken old->new chain across sequential and concurrent mutations
//! - `list_status_changes` ordering and pagination
//! - overall-status recomputation after each change

mod common;
use common::{create_test_org, create_test_service, create_test_state, create_test_user};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use statusdeck::models::prelude::*;
use statusdeck::models::service_status_log;
use statusdeck::services::status::ServiceStatus;
use statusdeck::services::status_log::{change_service_status, list_status_changes};

#[tokio::test]
async fn status_change_writes_service_and_log_atomically() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;

    let change = change_service_status(&state, svc.id, ServiceStatus::MajorOutage, &admin)
        .await
        .unwrap();

    assert_eq!(change.service.status, "major_outage");
    assert!(change.status_changed);
    assert_eq!(change.log.old_status.as_deref(), Some("operational"));
    assert_eq!(change.log.new_status, "major_outage");
    assert_eq!(change.log.changed_by, admin.id);
    assert_eq!(change.log.organization_id, org.id);

    let logs = ServiceStatusLog::find().all(&state.db).await.unwrap();
    assert_eq!(logs.len(), 1, "exactly one log row per accepted mutation");

    let stored = Service::find_by_id(svc.id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "major_outage");
}

#[tokio::test]
async fn sequential_mutations_form_unbroken_chain() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;

    let sequence = [
        ServiceStatus::DegradedPerformance,
        ServiceStatus::PartialOutage,
        ServiceStatus::MajorOutage,
        ServiceStatus::Operational,
    ];
    for status in sequence {
        change_service_status(&state, svc.id, status, &admin)
            .await
            .unwrap();
    }

    let logs = ServiceStatusLog::find()
        .filter(service_status_log::Column::ServiceId.eq(svc.id))
        .order_by_asc(service_status_log::Column::CreatedAt)
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 4);

    assert_eq!(logs[0].old_status.as_deref(), Some("operational"));
    for pair in logs.windows(2) {
        assert_eq!(
            pair[1].old_status.as_deref(),
            Some(pair[0].new_status.as_str()),
            "log chain must have no gaps"
        );
    }
    assert_eq!(logs[3].new_status, "operational");
}

#[tokio::test]
async fn concurrent_mutations_keep_chain_intact() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;

    let mut handles = Vec::new();
    for status in [
        ServiceStatus::DegradedPerformance,
        ServiceStatus::PartialOutage,
        ServiceStatus::MajorOutage,
        ServiceStatus::UnderMaintenance,
    ] {
        let state = state.clone();
        let admin = admin.clone();
        let service_id = svc.id;
        handles.push(tokio::spawn(async move {
            change_service_status(&state, service_id, status, &admin)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let logs = ServiceStatusLog::find()
        .filter(service_status_log::Column::ServiceId.eq(svc.id))
        .order_by_asc(service_status_log::Column::CreatedAt)
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 4);

    // Per-service serialization means each writer observed the committed
    // value of its predecessor.
    assert_eq!(logs[0].old_status.as_deref(), Some("operational"));
    for pair in logs.windows(2) {
        assert_eq!(
            pair[1].old_status.as_deref(),
            Some(pair[0].new_status.as_str())
        );
    }
}

#[tokio::test]
async fn list_status_changes_is_newest_first_and_paginated() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;

    for status in [
        ServiceStatus::DegradedPerformance,
        ServiceStatus::PartialOutage,
        ServiceStatus::Operational,
    ] {
        change_service_status(&state, svc.id, status, &admin)
            .await
            .unwrap();
    }

    let all = list_status_changes(&state.db, org.id, 10, 0).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].new_status, "operational");
    assert_eq!(all[2].new_status, "degraded_performance");

    let page = list_status_changes(&state.db, org.id, 2, 1).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].new_status, "partial_outage");
}

#[tokio::test]
async fn overall_status_follows_worst_service() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let _ok = create_test_service(&state.db, org.id, "Website", "operational").await;
    let _degraded = create_test_service(&state.db, org.id, "Search", "degraded_performance").await;
    let broken = create_test_service(&state.db, org.id, "API", "major_outage").await;

    // Recovering the worst service leaves the next-worst in charge.
    let change = change_service_status(&state, broken.id, ServiceStatus::Operational, &admin)
        .await
        .unwrap();
    assert_eq!(change.overall, ServiceStatus::DegradedPerformance);
}

#[tokio::test]
async fn unchanged_status_is_still_logged() {
    let state = create_test_state().await;
    let admin = create_test_user(&state.db, "admin@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, admin.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;

    let change = change_service_status(&state, svc.id, ServiceStatus::Operational, &admin)
        .await
        .unwrap();
    assert!(!change.status_changed);

    let logs = ServiceStatusLog::find().all(&state.db).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].old_status.as_deref(), Some("operational"));
    assert_eq!(logs[0].new_status, "operational");
}
