//! Signed token issuance and verification.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url)
//! signed with HS256 under a process-wide secret. Nothing is stored
//! server-side: validity is the signature plus a clock comparison.
//! Replacing the secret invalidates every outstanding token.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use tollgate_core::{AuthError, Clock, SystemClock};

use crate::claims::{Claims, validate_claims};
use crate::config::{AuthConfig, ConfigError};
use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, bad structure, or expired. Which one is not disclosed.
    #[error("invalid token")]
    Invalid,

    /// Encoding failed. Not a credentials problem.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

/// Token issuer and verifier.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    ttl: Duration,
    leeway: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Build from validated configuration, reading the system clock.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let ttl = Duration::from_std(config.token_ttl)
            .map_err(|_| ConfigError::DurationOutOfRange(config.token_ttl))?;
        let leeway =
            Duration::from_std(config.leeway).map_err(|_| ConfigError::DurationOutOfRange(config.leeway))?;

        // Expiry is checked by `validate_claims` against the injected clock,
        // so the library's own time checks are off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let secret = config.signing_secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            header: Header::new(Algorithm::HS256),
            validation,
            ttl,
            leeway,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Claims a token issued to `principal` at `now` would carry.
    pub fn claims_for(&self, principal: &Principal, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry is out of range".to_string()))?;
        Ok(Claims {
            subject_id: principal.id.clone(),
            identifier: principal.identifier.clone(),
            role: principal.role.as_str().to_string(),
            issued_at,
            expires_at,
        })
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        self.issue_at(principal, self.clock.now())
    }

    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.claims_for(principal, now)?;
        encode(&self.header, &claims, &self.encoding).map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, self.clock.now())
    }

    /// Verify signature and structure, then expiry at `now`.
    ///
    /// Every failure collapses to [`TokenError::Invalid`]; the precise cause
    /// is only visible in debug logs.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(cause = ?e.kind(), "token rejected");
            TokenError::Invalid
        })?;

        validate_claims(&data.claims, now, self.leeway).map_err(|e| {
            tracing::debug!(subject_id = %data.claims.subject_id, cause = %e, "token rejected");
            TokenError::Invalid
        })?;

        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.header.alg)
            .field("ttl", &self.ttl)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}
