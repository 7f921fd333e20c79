//! Internal utilities for identity management.
//!
//! Password hashing, token minting and input validation used by the
//! credential store and auth service.

pub mod jwt;
pub mod password;
pub mod validation;

pub use jwt::{Claims, TokenAuthority, MIN_SECRET_BYTES};
pub use password::SecretHasher;
pub use validation::{validate_email, validate_password, validate_username};
