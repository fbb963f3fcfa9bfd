//! Boundary error model.

use thiserror::Error;

/// Result type used at the kernel boundary.
pub type AuthResult<T> = Result<T, AuthError>;

/// Error kinds surfaced past the kernel boundary.
///
/// Component errors (store, token, login, authorization) convert into this
/// enum. Variants carry no detail that would let a caller tell an unknown
/// identifier from a wrong secret, or an expired token from a forged one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The requested principal does not exist.
    #[error("not found")]
    NotFound,

    /// A principal with the same id or identifier already exists.
    #[error("already exists")]
    AlreadyExists,

    /// Login failed. Deliberately carries no reason.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token failed signature, structure, or expiry checks.
    #[error("invalid token")]
    InvalidToken,

    /// No usable credential was presented.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated, but the role lacks the capability.
    #[error("unauthorized")]
    Unauthorized,

    /// Input failed validation (e.g. malformed identifier).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Startup configuration is unusable. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal failure (lock poisoning, signing failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status an outer transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::Unauthenticated => 401,
            AuthError::Unauthorized => 403,
            AuthError::NotFound => 404,
            AuthError::AlreadyExists => 409,
            AuthError::Validation(_) => 400,
            AuthError::Configuration(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotFound => "not_found",
            AuthError::AlreadyExists => "already_exists",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Validation(_) => "validation_error",
            AuthError::Configuration(_) => "configuration_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Whether the process can keep serving after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AuthError::Configuration(_))
    }
}
