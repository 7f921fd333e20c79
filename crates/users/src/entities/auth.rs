use super::user::{User, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator embedded in every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access and refresh token handed out on register and login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Result of a successful register or login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// A token that passed signature, expiry and kind checks.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub user_id: String,
    /// Present on access tokens only
    pub role: Option<UserRole>,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

/// The caller behind an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub role: UserRole,
}

impl Identity {
    /// Admins satisfy every role requirement.
    pub fn has_role(&self, required: UserRole) -> bool {
        self.role == UserRole::Admin || self.role == required
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
