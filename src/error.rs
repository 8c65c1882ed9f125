use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::telemetry::metrics::REPORT_REJECTIONS_TOTAL;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid or missing API token")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation",
            AppError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Unexpected(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Unauthorized => tracing::warn!("Rejected request with bad API token"),
            AppError::Validation(msg) => tracing::info!(error = %msg, "Rejected report request"),
            AppError::Unexpected(msg) => tracing::error!(error = %msg, "Unexpected error"),
        }

        REPORT_REJECTIONS_TOTAL.add(
            1,
            &[opentelemetry::KeyValue::new("error.type", self.kind())],
        );

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_error() {
        let error = AppError::Unauthorized;
        assert_eq!(error.to_string(), "Invalid or missing API token");
    }

    #[test]
    fn test_validation_error() {
        let error = AppError::Validation("Missing required fields: hostname".to_string());
        assert_eq!(error.to_string(), "Missing required fields: hostname");
    }

    #[test]
    fn test_unexpected_error() {
        let error = AppError::Unexpected("backend unreachable".to_string());
        assert_eq!(
            error.to_string(),
            "An unexpected error occurred: backend unreachable"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let error: AppError = anyhow::anyhow!("boom").into();
        assert!(matches!(error, AppError::Unexpected(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                AppError::Validation("test".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Unexpected("test".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.status(), expected_status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Validation("Missing JSON body".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Missing JSON body" }));
    }

    #[test]
    fn test_app_result_err() {
        fn returns_err() -> AppResult<i32> {
            Err(AppError::Unauthorized)
        }
        assert!(returns_err().is_err());
    }
}
