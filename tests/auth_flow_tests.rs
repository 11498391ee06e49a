//! Endpoint tests for registration, login and profile access.

mod common;
use common::{create_test_state, create_test_user, json_request, send_request, token_for};

use axum::http::StatusCode;

#[tokio::test]
async fn register_then_login_round_trip() {
    let state = create_test_state().await;

    let (status, body) = send_request(
        state.clone(),
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "hunter42",
                "firstName": "Alice",
                "lastName": "Anders",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["user"]["email"], "alice@example.com");
    assert!(
        body["data"]["user"]["hashedPassword"].is_null()
            && body["data"]["user"]["hashed_password"].is_null(),
        "password hash must never serialize"
    );

    let (status, body) = send_request(
        state.clone(),
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "hunter42",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send_request(
        state,
        json_request("GET", "/api/auth/me", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let state = create_test_state().await;
    create_test_user(&state.db, "alice@example.com", "password123", "member").await;

    let (status, body) = send_request(
        state,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "hunter42",
                "firstName": "Alice",
                "lastName": "Anders",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn register_validates_fields() {
    let state = create_test_state().await;

    let (status, body) = send_request(
        state,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            Some(serde_json::json!({
                "email": "not-an-email",
                "password": "x",
                "firstName": "",
                "lastName": "Anders",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"first_name"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let state = create_test_state().await;
    create_test_user(&state.db, "alice@example.com", "password123", "member").await;

    let (status, body) = send_request(
        state,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "wrong",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let state = create_test_state().await;

    let (status, _) = send_request(
        state.clone(),
        json_request("GET", "/api/organizations/", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_request(
        state,
        json_request("GET", "/api/organizations/", Some("garbage-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let state = create_test_state().await;
    let user = create_test_user(&state.db, "alice@example.com", "password123", "member").await;
    let token = token_for(&user);

    let (status, _) = send_request(
        state.clone(),
        json_request(
            "PUT",
            "/api/auth/change-password",
            Some(&token),
            Some(serde_json::json!({
                "currentPassword": "wrong",
                "newPassword": "new-password",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_request(
        state.clone(),
        json_request(
            "PUT",
            "/api/auth/change-password",
            Some(&token),
            Some(serde_json::json!({
                "currentPassword": "password123",
                "newPassword": "new-password",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The new password works for login.
    let (status, _) = send_request(
        state,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "alice@example.com",
                "password": "new-password",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
