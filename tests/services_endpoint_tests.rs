//! Endpoint tests for service management: CRUD, status patching with audit,
//! uptime validation and reordering.

mod common;
use common::{
    add_member, create_test_org, create_test_service, create_test_state, create_test_user,
    json_request, send_request, token_for,
};

use axum::http::StatusCode;
use sea_orm::EntityTrait;
use statusdeck::models::prelude::*;

#[tokio::test]
async fn create_and_list_services() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let token = token_for(&owner);

    let (status, body) = send_request(
        state.clone(),
        json_request(
            "POST",
            &format!("/api/services/organization/{}", org.id),
            Some(&token),
            Some(serde_json::json!({ "name": "API", "url": "https://api.acme.test" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["service"]["status"], "operational");
    assert_eq!(body["data"]["service"]["uptime_percentage"], 100.0);

    let (status, body) = send_request(
        state,
        json_request(
            "GET",
            &format!("/api/services/organization/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let services = body["data"]["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["activeIncidents"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn plain_member_cannot_mutate_services() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let member = create_test_user(&state.db, "dev@example.com", "password123", "member").await;
    add_member(&state.db, org.id, member.id, "member").await;
    let token = token_for(&member);

    let (status, _) = send_request(
        state.clone(),
        json_request(
            "POST",
            &format!("/api/services/organization/{}", org.id),
            Some(&token),
            Some(serde_json::json!({ "name": "API" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Viewing is allowed for members.
    let (status, _) = send_request(
        state,
        json_request(
            "GET",
            &format!("/api/services/organization/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn status_patch_logs_and_reports_overall() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;
    create_test_service(&state.db, org.id, "Website", "operational").await;
    let token = token_for(&owner);

    let (status, body) = send_request(
        state.clone(),
        json_request(
            "PATCH",
            &format!("/api/services/{}/status", svc.id),
            Some(&token),
            Some(serde_json::json!({ "status": "partial_outage" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["statusChanged"], true);
    assert_eq!(body["data"]["overallStatus"], "partial_outage");

    let logs = ServiceStatusLog::find().all(&state.db).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].new_status, "partial_outage");
}

#[tokio::test]
async fn unknown_status_value_is_rejected_before_persistence() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;
    let token = token_for(&owner);

    let (status, body) = send_request(
        state.clone(),
        json_request(
            "PATCH",
            &format!("/api/services/{}/status", svc.id),
            Some(&token),
            Some(serde_json::json!({ "status": "on-fire" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");

    // Nothing was coerced or written.
    let stored = Service::find_by_id(svc.id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "operational");
    assert_eq!(ServiceStatusLog::find().all(&state.db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn uptime_patch_validates_range() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;
    let token = token_for(&owner);

    let (status, _) = send_request(
        state.clone(),
        json_request(
            "PATCH",
            &format!("/api/services/{}/uptime", svc.id),
            Some(&token),
            Some(serde_json::json!({ "uptimePercentage": 150.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_request(
        state,
        json_request(
            "PATCH",
            &format!("/api/services/{}/uptime", svc.id),
            Some(&token),
            Some(serde_json::json!({ "uptimePercentage": 99.95 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uptimeChanged"], true);
    assert_eq!(body["data"]["service"]["uptime_percentage"], 99.95);
}

#[tokio::test]
async fn reorder_persists_sort_order() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let a = create_test_service(&state.db, org.id, "A", "operational").await;
    let b = create_test_service(&state.db, org.id, "B", "operational").await;
    let c = create_test_service(&state.db, org.id, "C", "operational").await;
    let token = token_for(&owner);

    let (status, body) = send_request(
        state,
        json_request(
            "PUT",
            &format!("/api/services/organization/{}/reorder", org.id),
            Some(&token),
            Some(serde_json::json!({ "serviceIds": [c.id, a.id, b.id] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn delete_service_removes_audit_rows_and_links() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let org = create_test_org(&state.db, owner.id, "Acme", "acme", "1234567").await;
    let svc = create_test_service(&state.db, org.id, "API", "operational").await;
    common::insert_status_log(
        &state.db,
        svc.id,
        org.id,
        owner.id,
        Some("operational"),
        "major_outage",
        chrono::Utc::now(),
    )
    .await;
    let token = token_for(&owner);

    let (status, _) = send_request(
        state.clone(),
        json_request(
            "DELETE",
            &format!("/api/services/{}", svc.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    use sea_orm::PaginatorTrait;
    assert_eq!(Service::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(ServiceStatusLog::find().count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_service_is_not_found() {
    let state = create_test_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", "password123", "admin").await;
    let token = token_for(&owner);

    let (status, _) = send_request(
        state,
        json_request(
            "GET",
            &format!("/api/services/{}", uuid::Uuid::new_v4()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
