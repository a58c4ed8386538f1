//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Terminal errors that cross the handler boundary.
///
/// Transient upstream failures never surface individually; the caller sees
/// one of these, or a success payload, per request.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No credentials configured; surfaced before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or empty required input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Allow-list gate rejection, with its reason
    #[error("Access denied: {0}")]
    AuthDenied(String),

    /// Every key in the plan failed; carries the last upstream error
    #[error("All upstream credentials exhausted: {0}")]
    CredentialExhausted(String),

    /// Upstream answered 2xx but the expected response part was missing
    #[error("Unexpected upstream response: {0}")]
    UpstreamFormat(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::services::GeminiServiceError> for ApiError {
    fn from(err: crate::services::GeminiServiceError) -> Self {
        use crate::services::GeminiServiceError;
        match err {
            GeminiServiceError::NoCredentials => {
                Self::Configuration("no upstream API keys configured".to_string())
            }
            GeminiServiceError::Exhausted(msg) => Self::CredentialExhausted(msg),
            GeminiServiceError::MissingPart(msg) => Self::UpstreamFormat(msg),
        }
    }
}

impl From<crate::services::AllowlistError> for ApiError {
    fn from(err: crate::services::AllowlistError) -> Self {
        use crate::services::AllowlistError;
        match err {
            AllowlistError::Denied(denial) => Self::AuthDenied(denial.to_string()),
            AllowlistError::Fetch(msg) => {
                Self::Internal(anyhow::anyhow!("allow-list unavailable: {msg}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Configuration(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", msg)
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "invalid_request_error", msg),
            ApiError::AuthDenied(msg) => (StatusCode::UNAUTHORIZED, "authentication_error", msg),
            ApiError::CredentialExhausted(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::UpstreamFormat(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::Internal(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error", err.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                type_: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Configuration("no keys".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Validation("empty prompt".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::AuthDenied("name/ip not on the list".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::CredentialExhausted("quota exceeded".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::UpstreamFormat("no image part".into()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
