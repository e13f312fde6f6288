//! Validation utilities for Web API DTOs.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// The body is deserialized as JSON and then checked with the `validator`
/// crate. Failures produce a 422 response with field-level details.
///
/// # Example
///
/// ```ignore
/// use mediashelf::web::dto::ValidatedJson;
///
/// async fn rename_asset(
///     ValidatedJson(req): ValidatedJson<RenameRequest>,
/// ) -> Result<Json<ApiResponse<OperationResponse>>, ApiError> {
///     // req is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

// ============================================================================
// Custom Validators
// ============================================================================

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

/// Run the name validators against a single request field.
///
/// `field` is the JSON field name reported back in the error details.
pub fn validate_name_field(field: &str, value: &str) -> Result<(), ApiError> {
    let messages: Vec<String> = [not_empty_trimmed(value), no_control_chars(value)]
        .into_iter()
        .filter_map(|r| r.err())
        .map(|e| {
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}", field))
        })
        .collect();

    if messages.is_empty() {
        return Ok(());
    }

    let mut details = HashMap::new();
    details.insert(field.to_string(), messages);
    Err(ApiError::validation(details))
}
