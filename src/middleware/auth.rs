use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, error::AppError};

pub const API_KEY_HEADER: &str = "Key";

/// Proof that the request carried the configured API token.
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        if verify_token(provided, state.config.api_token.as_deref()) {
            Ok(ApiKey)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Compares the trimmed header value with the configured token. Without a
/// configured token every request is rejected.
pub fn verify_token(provided: &str, expected: Option<&str>) -> bool {
    if provided.is_empty() {
        return false;
    }
    expected.is_some_and(|expected| provided.trim().as_bytes() == expected.as_bytes())
}
