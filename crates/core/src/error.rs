//! Unified error types for the analytics engine.
//!
//! Error codes:
//! - VALID_001-006: Input validation errors
//! - NOT_FOUND_001: No matching events
//! - DB_001: Storage errors
//! - INTERNAL_001: Anything else

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed request body or parameter
    InvalidFormat,
    /// VALID_002: Filter has no usable terms
    EmptyFilter,
    /// VALID_003: Chart configuration violates its type contract
    InvalidChart,
    /// VALID_004: Formula could not be parsed
    InvalidFormula,
    /// VALID_005: Stat value is negative or not finite
    InvalidStat,
    /// VALID_006: Benchmark request is unusable
    InvalidBenchmark,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::EmptyFilter => "VALID_002",
            Self::InvalidChart => "VALID_003",
            Self::InvalidFormula => "VALID_004",
            Self::InvalidStat => "VALID_005",
            Self::InvalidBenchmark => "VALID_006",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Unified error type for the analytics engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
    },

    /// Nothing matched the request.
    #[error("[NOT_FOUND_001] {0}")]
    NotFound(String),

    /// Storage layer failure.
    #[error("[DB_001] {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::validation(ValidationErrorCode::InvalidFormat, msg)
    }

    pub fn invalid_chart(msg: impl Into<String>) -> Self {
        Self::validation(ValidationErrorCode::InvalidChart, msg)
    }

    pub fn invalid_formula(msg: impl Into<String>) -> Self {
        Self::validation(ValidationErrorCode::InvalidFormula, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Serialization(_) => 400,
            Self::NotFound(_) => 404,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. } => code,
            Self::Serialization(_) => ValidationErrorCode::InvalidFormat.code(),
            Self::NotFound(_) => "NOT_FOUND_001",
            Self::Database(_) => "DB_001",
            Self::Internal(_) => "INTERNAL_001",
        }
    }

    /// The message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::NotFound(msg) | Self::Database(msg) | Self::Internal(msg) => msg.clone(),
            Self::Serialization(e) => e.to_string(),
        }
    }
}
