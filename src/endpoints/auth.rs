use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::endpoints::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::prelude::*;
use crate::models::{organization, organization_member, user};
use crate::schemas::{validate_payload, AuthResponse, LoginRequest, RegisterRequest, UserProfile};
use crate::services::security::{create_access_token, hash_password, verify_password};
use crate::state::AppState;

/// Create auth routes. Register and login are unauthenticated; the rest get
/// a per-route auth layer because this router is mounted outside the
/// protected tree.
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/me",
            get(get_me).put(update_me).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::middleware::require_auth,
            )),
        )
        .route(
            "/change-password",
            put(change_password).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::middleware::require_auth,
            )),
        )
        .route(
            "/refresh",
            post(refresh_token).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::middleware::require_auth,
            )),
        )
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    validate_payload(&request)?;

    let existing = User::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict {
            field: "email".to_string(),
            message: "User with this email already exists".to_string(),
        });
    }

    let now = Utc::now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(request.email),
        hashed_password: Set(hash_password(&request.password)?),
        first_name: Set(request.first_name),
        last_name: Set(request.last_name),
        role: Set("member".to_string()),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = new_user.insert(&state.db).await?;

    let token = create_access_token(&created.id.to_string(), &created.email)?;

    let Json(body) = ApiResponse::with_message(
        "User registered successfully",
        AuthResponse {
            token,
            user: created.into(),
        },
    );
    Ok((StatusCode::CREATED, Json(body)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    validate_payload(&request)?;

    let found = User::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !found.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".to_string()));
    }

    if !verify_password(&request.password, &found.hashed_password) {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let mut active: user::ActiveModel = found.clone().into();
    active.last_login_at = Set(Some(Utc::now()));
    let updated = active.update(&state.db).await?;

    let token = create_access_token(&updated.id.to_string(), &updated.email)?;

    Ok(ApiResponse::with_message(
        "Login successful",
        AuthResponse {
            token,
            user: updated.into(),
        },
    ))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationRef {
    id: Uuid,
    name: String,
    slug: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(flatten)]
    profile: UserProfile,
    owned_organizations: Vec<OrganizationRef>,
    member_organizations: Vec<OrganizationRef>,
}

async fn get_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<MeResponse>>> {
    let owned = Organization::find()
        .filter(organization::Column::OwnerId.eq(auth_user.0.id))
        .order_by_asc(organization::Column::Name)
        .all(&state.db)
        .await?;

    let memberships = OrganizationMember::find()
        .filter(organization_member::Column::UserId.eq(auth_user.0.id))
        .filter(organization_member::Column::Status.eq("active"))
        .all(&state.db)
        .await?;
    let member_org_ids: Vec<Uuid> = memberships.iter().map(|m| m.organization_id).collect();
    let member_orgs = Organization::find()
        .filter(organization::Column::Id.is_in(member_org_ids))
        .all(&state.db)
        .await?;

    let to_ref = |org: organization::Model| OrganizationRef {
        id: org.id,
        name: org.name,
        slug: org.slug,
    };

    Ok(ApiResponse::new(MeResponse {
        profile: auth_user.0.into(),
        owned_organizations: owned.into_iter().map(to_ref).collect(),
        member_organizations: member_orgs.into_iter().map(to_ref).collect(),
    }))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    first_name: Option<String>,
    last_name: Option<String>,
}

async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let mut active: user::ActiveModel = auth_user.0.into();
    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Profile updated successfully",
        updated.into(),
    ))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    if !verify_password(&request.current_password, &auth_user.0.hashed_password) {
        return Err(AppError::validation(
            "current_password",
            "Current password is incorrect",
        ));
    }

    if request.new_password.len() < 6 {
        return Err(AppError::validation(
            "new_password",
            "New password must be at least 6 characters long",
        ));
    }

    let mut active: user::ActiveModel = auth_user.0.into();
    active.hashed_password = Set(hash_password(&request.new_password)?);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    Ok(ApiResponse::with_message(
        "Password changed successfully",
        serde_json::json!({}),
    ))
}

async fn refresh_token(
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    let token = create_access_token(&auth_user.0.id.to_string(), &auth_user.0.email)?;
    Ok(ApiResponse::new(serde_json::json!({ "token": token })))
}
