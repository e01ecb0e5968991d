//! Shared error type across UmmahConnect crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// A form field failed validation.
    Validation,
    /// Credentials rejected or account already exists.
    AuthFailed,
    /// Referenced entity does not exist.
    NotFound,
    /// Not allowed by channel access policy.
    NotAllowed,
    /// Backend call failed (write, read, live query).
    Backend,
    /// Backend document did not match the expected schema.
    Decode,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in notices and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Validation => "VALIDATION",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::NotAllowed => "NOT_ALLOWED",
            ClientCode::Backend => "BACKEND",
            ClientCode::Decode => "DECODE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, UmmahError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum UmmahError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{field}: {msg}")]
    Validation { field: &'static str, msg: String },
    #[error("auth failed")]
    AuthFailed,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("backend: {0}")]
    Backend(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl UmmahError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            UmmahError::BadRequest(_) => ClientCode::BadRequest,
            UmmahError::Validation { .. } => ClientCode::Validation,
            UmmahError::AuthFailed => ClientCode::AuthFailed,
            UmmahError::NotFound(_) => ClientCode::NotFound,
            UmmahError::NotAllowed(_) => ClientCode::NotAllowed,
            UmmahError::Backend(_) => ClientCode::Backend,
            UmmahError::Decode(_) => ClientCode::Decode,
            UmmahError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            UmmahError::Internal(_) => ClientCode::Internal,
        }
    }

    pub fn validation(field: &'static str, msg: impl Into<String>) -> Self {
        UmmahError::Validation { field, msg: msg.into() }
    }
}
