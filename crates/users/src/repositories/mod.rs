//! Data access layer for identity management.
//!
//! Services depend on the [`UserRepo`] trait only; the bundled implementation
//! keeps everything in process memory.

pub mod user_repository;

pub use user_repository::{InMemoryUserRepository, UserRepo};
