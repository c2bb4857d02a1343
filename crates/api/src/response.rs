//! Response envelope and API errors.
//!
//! Success: `{"success": true, "data": ...}`.
//! Failure: `{"success": false, "error": "...", "code": "...", "details": [...]}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Handler result with the success envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error with a coded body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND_001", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<analytics_core::Error> for ApiError {
    fn from(err: analytics_core::Error) -> Self {
        use analytics_core::Error;

        match &err {
            Error::Validation { code, message } => {
                ApiError::validation(*code, vec![message.clone()])
            }
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            Error::NotFound(msg) => ApiError::not_found(msg),
            Error::Database(msg) => {
                error!(error = %msg, "Storage request failed");
                ApiError::with_code(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.error_code(),
                    "Storage unavailable",
                )
            }
            Error::Internal(msg) => {
                error!(error = %msg, "Internal error");
                ApiError::internal("Internal error")
            }
        }
    }
}
