//! Error taxonomy shared across the core.

use serde::Serialize;
use std::fmt;

/// The kind of failure a core operation reported.
///
/// Crate-specific error enums expose a `kind()` accessor returning one of
/// these, so callers can branch on the category without matching every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    InvalidCredentials,
    Forbidden,
    Malformed,
    Expired,
    WrongKind,
    Invalid,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Expired => "expired",
            ErrorKind::WrongKind => "wrong_kind",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
