//! Domain entities for identity and sessions.

pub mod auth;
pub mod user;

pub use auth::{AccessGrant, AuthSession, Identity, TokenKind, TokenPair, VerifiedToken};
pub use user::{UpdateUserRequest, User, UserRecord, UserRole};
