//! Credential store: owns user records and their secret hashes.

use parley_common::{Clock, SystemClock};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::entities::{UpdateUserRequest, User, UserRecord, UserRole};
use crate::repositories::{InMemoryUserRepository, UserRepo};
use crate::types::{AuthError, AuthResult};
use crate::utils::SecretHasher;

// Verified against when a login names an unknown user.
const DUMMY_SECRET: &str = "parley-dummy-secret";

/// Service for managing user records and verifying their secrets
pub struct CredentialStore<R> {
    repository: R,
    hasher: SecretHasher,
    clock: Arc<dyn Clock>,
    dummy_hash: OnceCell<String>,
}

impl CredentialStore<InMemoryUserRepository> {
    /// Create a store backed by process memory
    pub fn in_memory(hasher: SecretHasher) -> Self {
        Self::new(InMemoryUserRepository::new(), hasher)
    }
}

impl<R> CredentialStore<R>
where
    R: UserRepo,
{
    /// The dummy hash is computed here so the first unknown-user login costs
    /// the same as any other. If that fails it is retried on first use.
    pub fn new(repository: R, hasher: SecretHasher) -> Self {
        let dummy_hash = OnceCell::new_with(hasher.hash(DUMMY_SECRET).ok());
        Self {
            repository,
            hasher,
            clock: Arc::new(SystemClock),
            dummy_hash,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a new user with the default role.
    ///
    /// The secret is hashed before the record is inserted; the repository
    /// re-checks uniqueness atomically with the insert, so a concurrent
    /// registration for the same username or email still loses.
    pub async fn create(&self, username: &str, email: &str, secret: &str) -> AuthResult<User> {
        // Cheap early rejection, so a duplicate does not pay for a hash.
        self.ensure_available(username, email).await?;

        let password_hash = self.hash_secret(secret).await?;
        let record = UserRecord::new(
            username.to_string(),
            email.to_string(),
            password_hash,
            self.clock.now(),
        );

        let user = self.repository.create(record).await?;
        info!(user_id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    /// `AlreadyExists` when the username or email is taken. Advisory only:
    /// `create` is still decided by the repository's atomic insert.
    pub async fn ensure_available(&self, username: &str, email: &str) -> AuthResult<()> {
        if self.repository.find_by_username(username).await?.is_some() {
            return Err(AuthError::AlreadyExists { field: "username" });
        }
        if self.repository.find_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyExists { field: "email" });
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> AuthResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .map(|record| record.user)
            .ok_or(AuthError::NotFound)
    }

    pub async fn find_by_username(&self, username: &str) -> AuthResult<User> {
        self.repository
            .find_by_username(username)
            .await?
            .map(|record| record.user)
            .ok_or(AuthError::NotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> AuthResult<User> {
        self.repository
            .find_by_email(email)
            .await?
            .map(|record| record.user)
            .ok_or(AuthError::NotFound)
    }

    /// Check a candidate secret against a stored hash
    pub async fn verify_secret(&self, stored_hash: &str, candidate: &str) -> AuthResult<bool> {
        let stored_hash = stored_hash.to_string();
        let candidate = candidate.to_string();
        self.blocking(move |hasher| hasher.verify(&candidate, &stored_hash))
            .await
    }

    /// Resolve a username and secret to a user.
    ///
    /// Unknown usernames still pay for one verification, and both failure
    /// paths return the same `InvalidCredentials` error.
    pub async fn authenticate(&self, username: &str, secret: &str) -> AuthResult<User> {
        let record = self.repository.find_by_username(username).await?;

        let (stored_hash, user) = match record {
            Some(record) => (record.password_hash, Some(record.user)),
            None => (self.dummy_hash().await?, None),
        };

        let verified = self.verify_secret(&stored_hash, secret).await?;
        match user {
            Some(user) if verified => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Change username and/or email. Uniqueness is re-checked by the repository.
    pub async fn update_profile(&self, id: &str, request: UpdateUserRequest) -> AuthResult<User> {
        let request = UpdateUserRequest {
            username: request.username,
            email: request.email,
            role: None,
        };
        let user = self
            .repository
            .update(id, &request, self.clock.now())
            .await?;
        debug!(user_id = %user.id, "updated profile");
        Ok(user)
    }

    pub async fn set_role(&self, id: &str, role: UserRole) -> AuthResult<User> {
        let request = UpdateUserRequest {
            role: Some(role),
            ..Default::default()
        };
        let user = self
            .repository
            .update(id, &request, self.clock.now())
            .await?;
        info!(user_id = %user.id, role = %role, "changed role");
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> AuthResult<()> {
        self.repository.delete(id).await?;
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    /// Users in registration order
    pub async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<User>> {
        self.repository.list(limit, offset).await
    }

    pub async fn count(&self) -> AuthResult<usize> {
        self.repository.count().await
    }

    async fn hash_secret(&self, secret: &str) -> AuthResult<String> {
        let secret = secret.to_string();
        self.blocking(move |hasher| hasher.hash(&secret)).await
    }

    async fn dummy_hash(&self) -> AuthResult<String> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_secret(DUMMY_SECRET))
            .await
            .cloned()
    }

    /// Run CPU-bound hashing work on the blocking pool.
    async fn blocking<T, F>(&self, work: F) -> AuthResult<T>
    where
        F: FnOnce(SecretHasher) -> AuthResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || work(hasher))
            .await
            .map_err(|err| AuthError::Internal(format!("hashing task failed: {}", err)))?
    }
}
