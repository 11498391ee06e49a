pub mod auth;
pub mod incident;
pub mod organization;
pub mod service;

pub use auth::*;
pub use incident::*;
pub use organization::*;
pub use service::*;

use std::str::FromStr;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, FieldError, Result};
use crate::services::status::UnknownStatus;

/// Run derive-based validation, mapping failures to the API error shape.
/// Validation happens before any persistence write.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(validation_errors_to_app_error)
}

fn validation_errors_to_app_error(errors: ValidationErrors) -> AppError {
    let mut fields = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs.iter() {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            fields.push(FieldError {
                field: field.to_string(),
                message,
            });
        }
    }
    AppError::Validation {
        message: "Validation failed".to_string(),
        errors: fields,
    }
}

/// Parse an enum-valued field, rejecting unknown values before persistence.
pub fn parse_enum_field<T>(field: &str, raw: &str) -> Result<T>
where
    T: FromStr<Err = UnknownStatus>,
{
    raw.parse::<T>().map_err(|UnknownStatus(value)| {
        AppError::validation(field, format!("Invalid value: {}", value))
    })
}

/// Slug: lowercase alphanumerics and dashes only.
pub(crate) fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("Slug may only contain lowercase letters, digits and dashes".into());
        Err(err)
    }
}

/// Hex color of the form `#rrggbb`.
pub(crate) fn validate_hex_color(color: &str) -> std::result::Result<(), ValidationError> {
    let bytes = color.as_bytes();
    let ok = bytes.len() == 7
        && bytes[0] == b'#'
        && bytes[1..].iter().all(|b| b.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("Color must be a #rrggbb hex value".into());
        Err(err)
    }
}
