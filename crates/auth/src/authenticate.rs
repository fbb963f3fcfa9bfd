//! Login: identifier + secret in, signed token out.
//!
//! `IdentifierLookup -> SecretVerification -> TokenIssuance`, ending in a
//! token or one uniform [`AuthnError::InvalidCredentials`]. An unknown
//! identifier is verified against a throwaway digest so it costs the same
//! hash work as a wrong secret.

use thiserror::Error;

use tollgate_core::AuthError;

use crate::{CredentialStore, PasswordHasher, Principal, TokenService};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthnError {
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Store or signing failure. Not a credentials problem.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthnError> for AuthError {
    fn from(value: AuthnError) -> Self {
        match value {
            AuthnError::InvalidCredentials => AuthError::InvalidCredentials,
            AuthnError::Internal(msg) => AuthError::Internal(msg),
        }
    }
}

/// Login stage a rejection happened in. Debug logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStage {
    IdentifierLookup,
    SecretVerification,
}

impl LoginStage {
    fn as_str(&self) -> &'static str {
        match self {
            Self::IdentifierLookup => "identifier_lookup",
            Self::SecretVerification => "secret_verification",
        }
    }
}

pub struct Authenticator<S> {
    store: S,
    hasher: PasswordHasher,
    tokens: TokenService,
    dummy_digest: String,
}

impl<S: CredentialStore> Authenticator<S> {
    /// Hashes one random throwaway secret up front; fails only if hashing does.
    pub fn new(store: S, hasher: PasswordHasher, tokens: TokenService) -> Result<Self, AuthError> {
        let throwaway = tollgate_core::PrincipalId::generate();
        let dummy_digest = hasher.hash(throwaway.as_str())?;
        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_digest,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Exchange credentials for a token.
    pub fn authenticate(&self, identifier: &str, secret: &str) -> Result<String, AuthnError> {
        let found = self
            .store
            .find_by_identifier(identifier)
            .map_err(|e| AuthnError::Internal(e.to_string()))?;

        // Both branches run exactly one verify.
        let verified = self.hasher.verify(secret, self.candidate_digest(found.as_ref()));

        let principal = match (found.as_ref(), verified) {
            (Some(p), true) => p,
            (None, _) => return Err(reject(identifier, LoginStage::IdentifierLookup)),
            (Some(_), false) => return Err(reject(identifier, LoginStage::SecretVerification)),
        };

        let token = self.tokens.issue(principal).map_err(|e| {
            tracing::error!(principal_id = %principal.id, error = %e, "token issuance failed");
            AuthnError::Internal(e.to_string())
        })?;

        tracing::info!(principal_id = %principal.id, role = %principal.role, "login accepted");
        Ok(token)
    }

    /// Digest the secret is checked against: the stored one, or the
    /// throwaway when the identifier is unknown.
    fn candidate_digest<'a>(&'a self, found: Option<&'a Principal>) -> &'a str {
        match found {
            Some(p) => p.secret_hash(),
            None => &self.dummy_digest,
        }
    }
}

fn reject(identifier: &str, stage: LoginStage) -> AuthnError {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(identifier, stage = stage.as_str(), "login rejected");
    } else {
        tracing::info!(identifier, "login rejected");
    }
    AuthnError::InvalidCredentials
}

impl<S> core::fmt::Debug for Authenticator<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
