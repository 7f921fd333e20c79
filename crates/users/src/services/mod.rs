//! Business logic layer for identity management.

pub mod auth_service;
pub mod credential_store;

pub use auth_service::{AuthService, TOKEN_TYPE};
pub use credential_store::CredentialStore;
