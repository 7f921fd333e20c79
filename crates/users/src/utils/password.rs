//! Password hashing and verification utilities.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use parley_config::PasswordHashConfig;

use crate::types::{AuthError, AuthResult, ConfigError};

/// Salted Argon2id hasher with injectable cost parameters.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, ConfigError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| ConfigError::HashParameters(err.to_string()))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &PasswordHashConfig) -> Result<Self, ConfigError> {
        Self::new(config.memory_kib, config.iterations, config.parallelism)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AuthError::PasswordHash(err.to_string()))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against its hash.
    ///
    /// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be
    /// parsed or verification itself fails.
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|err| AuthError::PasswordHash(err.to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::PasswordHash(err.to_string())),
        }
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
