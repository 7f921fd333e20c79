//! Authentication service for managing auth operations.

use parley_config::AuthConfig;
use tracing::{debug, info, warn};

use crate::entities::{
    AccessGrant, AuthSession, Identity, TokenKind, TokenPair, UpdateUserRequest, User, UserRole,
};
use crate::repositories::{InMemoryUserRepository, UserRepo};
use crate::services::CredentialStore;
use crate::types::{AuthError, AuthResult, ConfigError};
use crate::utils::{
    validate_email, validate_password, validate_username, SecretHasher, TokenAuthority,
};

pub const TOKEN_TYPE: &str = "Bearer";

/// Service for managing authentication operations
pub struct AuthService<R = InMemoryUserRepository> {
    store: CredentialStore<R>,
    tokens: TokenAuthority,
}

impl AuthService<InMemoryUserRepository> {
    /// Build an in-memory auth service from configuration.
    ///
    /// Fails when the signing secret is missing or too short, or when the
    /// hashing parameters are rejected.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let hasher = SecretHasher::from_config(&config.password_hash)?;
        let tokens = TokenAuthority::from_config(config)?;
        Ok(Self::new(CredentialStore::in_memory(hasher), tokens))
    }
}

impl<R> AuthService<R>
where
    R: UserRepo,
{
    pub fn new(store: CredentialStore<R>, tokens: TokenAuthority) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &CredentialStore<R> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// Register new user and sign them in.
    ///
    /// A taken username or email is reported as `AlreadyExists` before any
    /// format rule is applied.
    pub async fn register(&self, username: &str, email: &str, secret: &str) -> AuthResult<AuthSession> {
        self.store.ensure_available(username, email).await?;

        validate_username(username)?;
        validate_email(email)?;
        validate_password(secret)?;

        let user = self.store.create(username, email, secret).await?;
        let tokens = self.issue_pair(&user)?;

        info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(AuthSession { user, tokens })
    }

    /// Login user with username and secret
    pub async fn login(&self, username: &str, secret: &str) -> AuthResult<AuthSession> {
        let user = match self.store.authenticate(username, secret).await {
            Ok(user) => user,
            Err(err) => {
                if err == AuthError::InvalidCredentials {
                    warn!(username = %username, "login rejected");
                }
                return Err(err);
            }
        };

        let tokens = self.issue_pair(&user)?;

        info!(user_id = %user.id, "user logged in");
        Ok(AuthSession { user, tokens })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The role is read from the credential store, so role changes take effect
    /// at the next refresh. A user deleted since issuance cannot refresh.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AccessGrant> {
        let verified = self.tokens.verify(refresh_token, TokenKind::Refresh)?;

        let user = match self.store.find_by_id(&verified.user_id).await {
            Ok(user) => user,
            Err(AuthError::NotFound) => {
                warn!(user_id = %verified.user_id, "refresh for unknown user");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(err),
        };

        let access_token = self.tokens.issue_access(&user.id, user.role)?;

        debug!(user_id = %user.id, role = %user.role, "refreshed access token");
        Ok(AccessGrant {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in: self.tokens.access_ttl().num_seconds(),
        })
    }

    /// Resolve the caller behind an access token
    pub fn resolve_identity(&self, access_token: &str) -> AuthResult<Identity> {
        let verified = self.tokens.verify(access_token, TokenKind::Access)?;
        let role = verified
            .role
            .ok_or_else(|| AuthError::MalformedToken("access token without role".to_string()))?;

        Ok(Identity {
            user_id: verified.user_id,
            role,
        })
    }

    /// Resolve an access token and require a role in one step
    pub fn authorize(&self, access_token: &str, required: UserRole) -> AuthResult<Identity> {
        let identity = self.resolve_identity(access_token)?;
        Self::require_role(&identity, required)?;
        Ok(identity)
    }

    /// Admins satisfy every role requirement
    pub fn require_role(identity: &Identity, required: UserRole) -> AuthResult<()> {
        if identity.has_role(required) {
            Ok(())
        } else {
            Err(AuthError::forbidden(format!("{} role required", required)))
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> AuthResult<User> {
        self.store.find_by_id(user_id).await
    }

    /// Change the caller's username and/or email
    pub async fn update_profile(&self, user_id: &str, request: UpdateUserRequest) -> AuthResult<User> {
        if request.username.is_none() && request.email.is_none() {
            return Err(AuthError::validation("nothing to update"));
        }
        if let Some(ref username) = request.username {
            validate_username(username)?;
        }
        if let Some(ref email) = request.email {
            validate_email(email)?;
        }

        self.store.update_profile(user_id, request).await
    }

    /// Delete an account. Users may delete themselves; admins may delete anyone.
    pub async fn delete_account(&self, caller: &Identity, target_id: &str) -> AuthResult<()> {
        if caller.user_id != target_id && !caller.is_admin() {
            return Err(AuthError::forbidden("cannot delete another user's account"));
        }

        self.store.delete(target_id).await?;
        info!(user_id = %target_id, by = %caller.user_id, "account deleted");
        Ok(())
    }

    pub async fn list_users(&self, caller: &Identity, limit: usize, offset: usize) -> AuthResult<Vec<User>> {
        Self::require_role(caller, UserRole::Admin)?;
        self.store.list(limit, offset).await
    }

    pub async fn set_role(&self, caller: &Identity, target_id: &str, role: UserRole) -> AuthResult<User> {
        Self::require_role(caller, UserRole::Admin)?;
        self.store.set_role(target_id, role).await
    }

    fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access(&user.id, user.role)?,
            refresh_token: self.tokens.issue_refresh(&user.id)?,
            token_type: TOKEN_TYPE,
            expires_in: self.tokens.access_ttl().num_seconds(),
        })
    }
}
