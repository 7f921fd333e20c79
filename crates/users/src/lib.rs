//! # Parley Users Crate
//!
//! This crate provides credential storage, token issuance and session
//! management for Parley.
//!
//! ## Architecture
//!
//! - **Entities**: Domain models (User, TokenPair, Identity, etc.)
//! - **Services**: Credential store and auth service
//! - **Repositories**: The `UserRepo` persistence seam and its in-memory implementation
//! - **Types**: Error types
//! - **Utils**: Password hashing, JWT handling and input validation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use parley_users::AuthService;
//!
//! # async fn demo(config: parley_config::AuthConfig) -> anyhow::Result<()> {
//! let service = AuthService::from_config(&config)?;
//! let session = service.register("alice", "alice@example.com", "Secret123!").await?;
//! let identity = service.resolve_identity(&session.tokens.access_token)?;
//! # Ok(())
//! # }
//! ```

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{
    AccessGrant, AuthSession, Identity, TokenKind, TokenPair, UpdateUserRequest, User, UserRecord,
    UserRole, VerifiedToken,
};
pub use repositories::{InMemoryUserRepository, UserRepo};
pub use services::{AuthService, CredentialStore};
pub use types::{AuthError, AuthResult, ConfigError};
pub use utils::{SecretHasher, TokenAuthority};
