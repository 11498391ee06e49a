use serde::Deserialize;
use validator::Validate;

use super::{validate_hex_color, validate_slug};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(
        length(min = 3, max = 50, message = "Slug must be 3-50 characters"),
        custom(function = validate_slug)
    )]
    pub slug: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Website URL must be a valid URL"))]
    pub website_url: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    #[validate(custom(function = validate_hex_color))]
    pub primary_color: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Website URL must be a valid URL"))]
    pub website_url: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    #[validate(custom(function = validate_hex_color))]
    pub primary_color: Option<String>,
    pub timezone: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// "admin" | "member", defaults to member.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRoleRequest {
    /// "admin" | "member"
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinOrganizationRequest {
    #[validate(length(min = 1, message = "Organization slug is required"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Access code is required"))]
    pub access_code: String,
}
