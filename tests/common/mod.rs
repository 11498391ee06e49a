//! Test helpers and utilities for integration testing.
//!
//! Provides an in-memory database, entity factories and request plumbing for
//! endpoint-level tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;
use uuid::Uuid;

use statusdeck::migrations::Migrator;
use statusdeck::models::{incident, incident_service, incident_update, organization, service, user};
use statusdeck::services::security::hash_password;
use statusdeck::state::AppState;

/// Create an in-memory SQLite database for testing.
///
/// Pinned to one pooled connection so every query and transaction sees the
/// same in-memory database.
pub async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Application state backed by a fresh test database.
pub async fn create_test_state() -> AppState {
    AppState::new(create_test_db().await)
}

/// Create a test user. `role` is the global role ("admin" | "member").
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> user::Model {
    let now = Utc::now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        hashed_password: Set(hash_password(password).unwrap()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        role: Set(role.to_string()),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    new_user.insert(db).await.unwrap()
}

/// Create a test organization owned by `owner_id`.
pub async fn create_test_org(
    db: &DatabaseConnection,
    owner_id: Uuid,
    name: &str,
    slug: &str,
    access_code: &str,
) -> organization::Model {
    let now = Utc::now();
    let org = organization::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        description: Set(None),
        logo_url: Set(None),
        website_url: Set(None),
        primary_color: Set("#3b82f6".to_string()),
        is_public: Set(true),
        custom_domain: Set(None),
        access_code: Set(Some(access_code.to_string())),
        timezone: Set("UTC".to_string()),
        owner_id: Set(owner_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    org.insert(db).await.unwrap()
}

/// Create a test service in `organization_id` with the given status.
pub async fn create_test_service(
    db: &DatabaseConnection,
    organization_id: Uuid,
    name: &str,
    status: &str,
) -> service::Model {
    let now = Utc::now();
    let svc = service::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        status: Set(status.to_string()),
        url: Set(None),
        organization_id: Set(organization_id),
        sort_order: Set(0),
        is_public: Set(true),
        uptime_percentage: Set(100.0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    svc.insert(db).await.unwrap()
}

/// Insert an incident row directly, with full control over timestamps.
#[allow(clippy::too_many_arguments)]
pub async fn insert_incident(
    db: &DatabaseConnection,
    organization_id: Uuid,
    created_by: Uuid,
    title: &str,
    status: &str,
    kind: &str,
    is_public: bool,
    started_at: chrono::DateTime<Utc>,
) -> incident::Model {
    let row = incident::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(None),
        status: Set(status.to_string()),
        severity: Set("minor".to_string()),
        kind: Set(kind.to_string()),
        organization_id: Set(organization_id),
        created_by: Set(created_by),
        started_at: Set(started_at),
        resolved_at: Set(None),
        scheduled_for: Set(None),
        scheduled_until: Set(None),
        is_public: Set(is_public),
        notify_subscribers: Set(true),
        created_at: Set(started_at),
        updated_at: Set(started_at),
    };
    row.insert(db).await.unwrap()
}

/// Link an incident to a service.
pub async fn link_incident_service(
    db: &DatabaseConnection,
    incident_id: Uuid,
    service_id: Uuid,
) -> incident_service::Model {
    let link = incident_service::ActiveModel {
        incident_id: Set(incident_id),
        service_id: Set(service_id),
    };
    link.insert(db).await.unwrap()
}

/// Insert an incident update row directly.
pub async fn insert_incident_update(
    db: &DatabaseConnection,
    incident_id: Uuid,
    created_by: Uuid,
    title: &str,
    status: &str,
    is_public: bool,
    created_at: chrono::DateTime<Utc>,
) -> incident_update::Model {
    let row = incident_update::ActiveModel {
        id: Set(Uuid::new_v4()),
        incident_id: Set(incident_id),
        title: Set(title.to_string()),
        description: Set("update body".to_string()),
        status: Set(status.to_string()),
        created_by: Set(created_by),
        is_public: Set(is_public),
        notify_subscribers: Set(true),
        created_at: Set(created_at),
    };
    row.insert(db).await.unwrap()
}

/// Add a user to an organization with the given role.
pub async fn add_member(
    db: &DatabaseConnection,
    organization_id: Uuid,
    user_id: Uuid,
    role: &str,
) -> statusdeck::models::organization_member::Model {
    let membership = statusdeck::models::organization_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        organization_id: Set(organization_id),
        role: Set(role.to_string()),
        status: Set("active".to_string()),
        invited_by: Set(None),
        invited_at: Set(None),
        joined_at: Set(Utc::now()),
    };
    membership.insert(db).await.unwrap()
}

/// Insert a status-log row directly, giving full control over the timestamp
/// so timeline ordering tests are deterministic.
pub async fn insert_status_log(
    db: &DatabaseConnection,
    service_id: Uuid,
    organization_id: Uuid,
    changed_by: Uuid,
    old_status: Option<&str>,
    new_status: &str,
    created_at: chrono::DateTime<Utc>,
) -> statusdeck::models::service_status_log::Model {
    let row = statusdeck::models::service_status_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(service_id),
        organization_id: Set(organization_id),
        old_status: Set(old_status.map(|s| s.to_string())),
        new_status: Set(new_status.to_string()),
        changed_by: Set(changed_by),
        created_at: Set(created_at),
    };
    row.insert(db).await.unwrap()
}

/// Bearer token for `user`, as issued by the auth endpoints.
pub fn token_for(user: &user::Model) -> String {
    statusdeck::services::create_access_token(&user.id.to_string(), &user.email).unwrap()
}

/// Build a JSON request, optionally authenticated.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Run one request against the router and decode the JSON response.
pub async fn send_request(
    state: AppState,
    request: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    let app = statusdeck::endpoints::create_router(state);
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
