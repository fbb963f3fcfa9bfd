use serde::{Deserialize, Serialize};

use tollgate_core::{AuthError, PrincipalId};

use crate::Role;

/// Stored principal record.
///
/// Holds the password digest, so it is neither `Serialize` nor printed in
/// full by `Debug`. Use [`Principal::profile`] for anything leaving the kernel.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    /// Login name or email; unique across the store.
    pub identifier: String,
    pub display_name: String,
    pub role: Role,
    secret_hash: String,
}

impl Principal {
    /// Build a record from an already-hashed secret.
    pub fn new(
        id: PrincipalId,
        identifier: impl Into<String>,
        secret_hash: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            display_name: display_name.into(),
            role,
            secret_hash: secret_hash.into(),
        }
    }

    /// PHC digest of the secret. Only the password hasher should read this.
    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    pub fn profile(&self) -> PrincipalProfile {
        PrincipalProfile {
            id: self.id.clone(),
            identifier: self.identifier.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }

    /// Merge `patch` into this record. The id never changes.
    pub fn apply(&mut self, patch: PrincipalPatch) {
        if let Some(identifier) = patch.identifier {
            self.identifier = identifier;
        }
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(secret_hash) = patch.secret_hash {
            self.secret_hash = secret_hash;
        }
    }
}

impl core::fmt::Debug for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

/// Public view of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalProfile {
    pub id: PrincipalId,
    pub identifier: String,
    pub display_name: String,
    pub role: Role,
}

/// Registration input carrying the raw secret.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrincipal {
    pub id: PrincipalId,
    pub identifier: String,
    pub secret: String,
    pub display_name: String,
    pub role: Role,
}

impl NewPrincipal {
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.id.as_str().trim().is_empty() {
            return Err(AuthError::validation("id must not be empty"));
        }
        validate_identifier(&self.identifier)?;
        validate_display_name(&self.display_name)?;
        if self.secret.is_empty() {
            return Err(AuthError::validation("secret must not be empty"));
        }
        Ok(())
    }
}

impl core::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Partial update.
///
/// Has no `id` field: an `"id"` key in incoming JSON is ignored, so an
/// update can never re-key a record. The digest can only be set in code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrincipalPatch {
    pub identifier: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    #[serde(skip)]
    secret_hash: Option<String>,
}

impl PrincipalPatch {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn with_secret_hash(mut self, secret_hash: impl Into<String>) -> Self {
        self.secret_hash = Some(secret_hash.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.identifier.is_none()
            && self.display_name.is_none()
            && self.role.is_none()
            && self.secret_hash.is_none()
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if let Some(identifier) = &self.identifier {
            validate_identifier(identifier)?;
        }
        if let Some(display_name) = &self.display_name {
            validate_display_name(display_name)?;
        }
        Ok(())
    }
}

fn validate_identifier(identifier: &str) -> Result<(), AuthError> {
    if identifier.is_empty() {
        return Err(AuthError::validation("identifier must not be empty"));
    }
    if identifier.chars().any(char::is_whitespace) {
        return Err(AuthError::validation("identifier must not contain whitespace"));
    }
    if let Some((local, domain)) = identifier.split_once('@') {
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AuthError::validation("invalid email format"));
        }
    }
    Ok(())
}

fn validate_display_name(name: &str) -> Result<(), AuthError> {
    if name.trim().is_empty() {
        return Err(AuthError::validation("display name must not be empty"));
    }
    Ok(())
}
