use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    /// Defaults to "investigating".
    pub status: Option<String>,
    /// Defaults to "minor".
    pub severity: Option<String>,
    /// "incident" | "maintenance", defaults to "incident".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[validate(length(min = 1, message = "An incident must affect at least one service"))]
    pub service_ids: Vec<Uuid>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub scheduled_until: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub notify_subscribers: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIncidentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    #[validate(length(min = 1, message = "An incident must affect at least one service"))]
    pub service_ids: Option<Vec<Uuid>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub scheduled_until: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub notify_subscribers: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentUpdateRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: String,
    pub status: String,
    pub is_public: Option<bool>,
    pub notify_subscribers: Option<bool>,
}
