use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "URL must be a valid URL"))]
    pub url: Option<String>,
    /// One of the five service status values; defaults to operational.
    pub status: Option<String>,
    pub sort_order: Option<i32>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "URL must be a valid URL"))]
    pub url: Option<String>,
    pub status: Option<String>,
    pub sort_order: Option<i32>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateServiceStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceUptimeRequest {
    #[validate(range(
        min = 1.0,
        max = 100.0,
        message = "Uptime percentage must be a valid number between 1 and 100"
    ))]
    pub uptime_percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderServicesRequest {
    /// Service ids in the desired display order.
    pub service_ids: Vec<Uuid>,
}
