// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Error taxonomy for every failure a handler can surface. Missing,
/// malformed, and expired credentials all collapse to `Unauthenticated`;
/// the client is never told which one it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    Unauthenticated,
    ValidationFailed,
    DisallowedField,
    Conflict,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    Internal,
}

impl ApiErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::ValidationFailed => "validation_failed",
            Self::DisallowedField => "disallowed_field",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Internal => "internal_error",
        }
    }
}

/// One-line error with a semantic code. On the wire only the message is
/// shown, as `{"error": message}`; the code drives the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(ApiErrorCode::Unauthenticated, "User not logged in")
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::ValidationFailed, message)
    }

    #[must_use]
    pub fn disallowed_field(name: &str) -> Self {
        Self::new(
            ApiErrorCode::DisallowedField,
            format!("Field '{name}' is not allowed in this request"),
        )
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Conflict, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Forbidden, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
