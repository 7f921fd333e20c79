//! Shared types for the identity and session system.

pub mod errors;

pub use errors::{AuthError, AuthResult, ConfigError};
