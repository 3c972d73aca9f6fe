/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The data source could not be reached at all
    #[error("External API error: {0}")]
    ExternalApi(#[from] reqwest::Error),
    /// The data source answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn upstream_code(status: u16) -> &'static str {
    match status {
        403 => "UPSTREAM_403",
        404 => "UPSTREAM_404",
        429 => "UPSTREAM_429",
        500..=599 => "UPSTREAM_5XX",
        _ => "UPSTREAM_ERROR",
    }
}

impl ApiError {
    /// Stable machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ExternalApi(e) => e
                .status()
                .map(|s| upstream_code(s.as_u16()))
                .unwrap_or("UPSTREAM_ERROR"),
            ApiError::Upstream { status, .. } => upstream_code(*status),
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Failures are reported in-band with ok=false
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_codes() {
        let err = ApiError::Upstream {
            status: 429,
            body: "slow down".into(),
        };
        assert_eq!(err.code(), "UPSTREAM_429");

        let err = ApiError::Upstream {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.code(), "UPSTREAM_5XX");

        let err = ApiError::Upstream {
            status: 418,
            body: String::new(),
        };
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_invalid_input_message() {
        let err = ApiError::InvalidInput("limit must be between 1 and 1000".into());
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(
            err.to_string(),
            "Invalid input: limit must be between 1 and 1000"
        );
    }
}
