//! Password hashing and verification using Argon2id.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=..,t=..,p=1$salt$hash`) that
//! carry their own salt and parameters.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng},
};
use thiserror::Error;

use tollgate_core::AuthError;

use crate::config::{ConfigError, HashParams};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("failed to hash secret: {0}")]
    Hashing(String),
}

impl From<HashError> for AuthError {
    fn from(value: HashError) -> Self {
        AuthError::Internal(value.to_string())
    }
}

/// Salted, deliberately expensive one-way hasher.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    params: HashParams,
}

impl PasswordHasher {
    /// Fails if `params` are outside the accepted range.
    pub fn new(params: HashParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let argon_params = Params::new(params.memory_kib, params.cost, 1, None).map_err(|_| {
            ConfigError::MemoryOutOfRange {
                value: params.memory_kib,
                min: HashParams::MIN_MEMORY_KIB,
                max: HashParams::MAX_MEMORY_KIB,
            }
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params),
            params,
        })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hash `secret` with a fresh random salt. Two calls never return the
    /// same digest.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hashing(e.to_string()))
    }

    /// Check `secret` against `digest`.
    ///
    /// The digest comparison is constant-time. A malformed digest yields
    /// `false`, never an error.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2.verify_password(secret.as_bytes(), &parsed).is_ok()
    }
}

impl core::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("algorithm", &"argon2id")
            .field("params", &self.params)
            .finish()
    }
}
