//! JWT (JSON Web Token) issuance and verification.
//!
//! Access and refresh tokens share one HS256 signing secret and one encoding.
//! The `typ` claim tells them apart and is checked on every verification, so a
//! refresh token can never be replayed as an access token or vice versa.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parley_common::{Clock, SystemClock};
use parley_config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{TokenKind, UserRole, VerifiedToken};
use crate::types::{AuthError, AuthResult, ConfigError};

/// Minimum signing secret length accepted for HS256.
pub const MIN_SECRET_BYTES: usize = 32;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>, // Access tokens only
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: String,
}

/// Mints and verifies kind-tagged tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenAuthority {
    /// Create a token authority with the default lifetimes (15 minutes / 7 days).
    pub fn new(secret: &str, issuer: impl Into<String>) -> Result<Self, ConfigError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::WeakSigningSecret {
                min: MIN_SECRET_BYTES,
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or(ConfigError::MissingSigningSecret)?;

        Self::new(secret, config.issuer.clone())?
            .with_access_ttl(seconds(config.access_token_ttl_seconds, "access")?)?
            .with_refresh_ttl(seconds(config.refresh_token_ttl_seconds, "refresh")?)
    }

    /// Set a custom access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        if ttl <= Duration::zero() {
            return Err(ConfigError::InvalidLifetime("access"));
        }
        self.access_ttl = ttl;
        Ok(self)
    }

    /// Set a custom refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        if ttl <= Duration::zero() {
            return Err(ConfigError::InvalidLifetime("refresh"));
        }
        self.refresh_ttl = ttl;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a short-lived access token carrying the subject's role
    pub fn issue_access(&self, user_id: &str, role: UserRole) -> AuthResult<String> {
        self.mint(user_id, Some(role), TokenKind::Access, self.access_ttl)
    }

    /// Issue a long-lived refresh token. No role is embedded.
    pub fn issue_refresh(&self, user_id: &str) -> AuthResult<String> {
        self.mint(user_id, None, TokenKind::Refresh, self.refresh_ttl)
    }

    /// Validate signature, expiry and kind of a presented token
    pub fn verify(&self, token: &str, expected: TokenKind) -> AuthResult<VerifiedToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the injected clock, without leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| AuthError::MalformedToken(err.to_string()))?
            .claims;

        let now = self.clock.now().timestamp();
        if now > claims.exp {
            return Err(AuthError::TokenExpired);
        }

        if claims.typ != expected {
            return Err(AuthError::WrongTokenKind {
                expected,
                found: claims.typ,
            });
        }

        if claims.typ == TokenKind::Access && claims.role.is_none() {
            return Err(AuthError::MalformedToken(
                "access token is missing its role claim".to_string(),
            ));
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AuthError::MalformedToken("expiry out of range".to_string()))?;

        Ok(VerifiedToken {
            user_id: claims.sub,
            role: claims.role,
            kind: claims.typ,
            expires_at,
        })
    }

    fn mint(
        &self,
        user_id: &str,
        role: Option<UserRole>,
        kind: TokenKind,
        ttl: Duration,
    ) -> AuthResult<String> {
        let issued_at: DateTime<Utc> = self.clock.now();
        let expires_at = issued_at + ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            typ: kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::TokenSigning(err.to_string()))
    }
}

fn seconds(value: u64, which: &'static str) -> Result<Duration, ConfigError> {
    let secs = i64::try_from(value).map_err(|_| ConfigError::InvalidLifetime(which))?;
    Duration::try_seconds(secs).ok_or(ConfigError::InvalidLifetime(which))
}
