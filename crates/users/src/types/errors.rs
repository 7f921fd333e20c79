//! Error types for identity and session management.

use crate::entities::TokenKind;
use parley_common::ErrorKind;
use thiserror::Error;

/// Errors returned by the credential store, token authority and auth service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("{field} already exists")]
    AlreadyExists { field: &'static str },

    #[error("user not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("wrong token kind: expected {expected}, found {found}")]
    WrongTokenKind { expected: TokenKind, found: TokenKind },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("token signing failed: {0}")]
    TokenSigning(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            AuthError::NotFound => ErrorKind::NotFound,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::Forbidden { .. } => ErrorKind::Forbidden,
            AuthError::MalformedToken(_) => ErrorKind::Malformed,
            AuthError::TokenExpired => ErrorKind::Expired,
            AuthError::WrongTokenKind { .. } => ErrorKind::WrongKind,
            AuthError::Validation(_) => ErrorKind::Invalid,
            AuthError::PasswordHash(_) | AuthError::TokenSigning(_) | AuthError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Construction-time failures. These are never returned by a running service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret is not configured")]
    MissingSigningSecret,

    #[error("signing secret must be at least {min} bytes")]
    WeakSigningSecret { min: usize },

    #[error("token lifetime must be positive: {0}")]
    InvalidLifetime(&'static str),

    #[error("invalid password hash parameters: {0}")]
    HashParameters(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(
            AuthError::AlreadyExists { field: "email" }.to_string(),
            "email already exists"
        );
        assert_eq!(
            AuthError::WrongTokenKind {
                expected: TokenKind::Access,
                found: TokenKind::Refresh,
            }
            .to_string(),
            "wrong token kind: expected access, found refresh"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AuthError::TokenExpired.kind(), ErrorKind::Expired);
        assert_eq!(
            AuthError::MalformedToken("bad".into()).kind(),
            ErrorKind::Malformed
        );
        assert_eq!(AuthError::forbidden("nope").kind(), ErrorKind::Forbidden);
        assert_eq!(AuthError::PasswordHash("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(AuthError::validation("x").kind(), ErrorKind::Invalid);
    }
}
