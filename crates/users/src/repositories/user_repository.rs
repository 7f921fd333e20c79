//! User persistence seam and its in-memory implementation.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;

use crate::entities::{UpdateUserRequest, User, UserRecord};
use crate::types::{AuthError, AuthResult};

/// Trait for user repositories to allow generic usage
pub trait UserRepo: Send + Sync {
    /// Insert a record, failing with `AlreadyExists` when its username or
    /// email is taken. The check and the insert must be atomic.
    fn create(&self, record: UserRecord) -> impl Future<Output = AuthResult<User>> + Send;
    fn find_by_id(&self, id: &str) -> impl Future<Output = AuthResult<Option<UserRecord>>> + Send;
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = AuthResult<Option<UserRecord>>> + Send;
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = AuthResult<Option<UserRecord>>> + Send;
    fn update(
        &self,
        id: &str,
        request: &UpdateUserRequest,
        now: DateTime<Utc>,
    ) -> impl Future<Output = AuthResult<User>> + Send;
    fn delete(&self, id: &str) -> impl Future<Output = AuthResult<()>> + Send;
    /// Users in registration order
    fn list(&self, limit: usize, offset: usize) -> impl Future<Output = AuthResult<Vec<User>>> + Send;
    fn count(&self) -> impl Future<Output = AuthResult<usize>> + Send;
}

#[derive(Default)]
struct UserTable {
    users: HashMap<String, UserRecord>,
    by_username: HashMap<String, String>,
    by_email: HashMap<String, String>,
    order: Vec<String>,
}

/// Whether `key` is held by someone other than `owner`.
fn taken(index: &HashMap<String, String>, key: &str, owner: Option<&str>) -> bool {
    match index.get(key) {
        Some(id) => owner != Some(id.as_str()),
        None => false,
    }
}

/// User repository backed by process memory.
///
/// Records and both uniqueness indexes live behind one lock, so a uniqueness
/// check and the write that depends on it are never interleaved with another
/// writer.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepo for InMemoryUserRepository {
    async fn create(&self, record: UserRecord) -> AuthResult<User> {
        let mut table = self.table.write().await;

        if taken(&table.by_username, &record.user.username, None) {
            return Err(AuthError::AlreadyExists { field: "username" });
        }
        if taken(&table.by_email, &record.user.email, None) {
            return Err(AuthError::AlreadyExists { field: "email" });
        }

        let id = record.user.id.clone();
        if table.users.contains_key(&id) {
            return Err(AuthError::Internal(format!("duplicate user id {}", id)));
        }

        let user = record.user.clone();
        table.by_username.insert(user.username.clone(), id.clone());
        table.by_email.insert(user.email.clone(), id.clone());
        table.order.push(id.clone());
        table.users.insert(id, record);

        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<UserRecord>> {
        let table = self.table.read().await;
        Ok(table.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<UserRecord>> {
        let table = self.table.read().await;
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let table = self.table.read().await;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateUserRequest,
        now: DateTime<Utc>,
    ) -> AuthResult<User> {
        let mut table = self.table.write().await;

        let current = match table.users.get(id) {
            Some(record) => record.user.clone(),
            None => return Err(AuthError::NotFound),
        };

        if let Some(ref username) = request.username {
            if taken(&table.by_username, username, Some(id)) {
                return Err(AuthError::AlreadyExists { field: "username" });
            }
        }
        if let Some(ref email) = request.email {
            if taken(&table.by_email, email, Some(id)) {
                return Err(AuthError::AlreadyExists { field: "email" });
            }
        }

        if let Some(ref username) = request.username {
            if *username != current.username {
                table.by_username.remove(&current.username);
                table.by_username.insert(username.clone(), id.to_string());
            }
        }
        if let Some(ref email) = request.email {
            if *email != current.email {
                table.by_email.remove(&current.email);
                table.by_email.insert(email.clone(), id.to_string());
            }
        }

        let record = table.users.get_mut(id).ok_or(AuthError::NotFound)?;
        if let Some(ref username) = request.username {
            record.user.username = username.clone();
        }
        if let Some(ref email) = request.email {
            record.user.email = email.clone();
        }
        if let Some(role) = request.role {
            record.user.role = role;
        }
        record.user.updated_at = now;

        Ok(record.user.clone())
    }

    async fn delete(&self, id: &str) -> AuthResult<()> {
        let mut table = self.table.write().await;

        let record = table.users.remove(id).ok_or(AuthError::NotFound)?;
        table.by_username.remove(&record.user.username);
        table.by_email.remove(&record.user.email);
        table.order.retain(|existing| existing != id);

        Ok(())
    }

    async fn list(&self, limit: usize, offset: usize) -> AuthResult<Vec<User>> {
        let table = self.table.read().await;
        Ok(table
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| table.users.get(id))
            .map(|record| record.user.clone())
            .collect())
    }

    async fn count(&self) -> AuthResult<usize> {
        Ok(self.table.read().await.users.len())
    }
}
