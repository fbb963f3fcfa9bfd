use tollgate_core::{AuthError, PrincipalId};

use crate::{CredentialStore, NewPrincipal, PasswordHasher, Principal, PrincipalPatch, PrincipalProfile};

/// Write side of the credential store: validates input and hashes raw
/// secrets before anything is stored.
///
/// Hashing happens before the store is touched, so no store lock is held
/// during hash work.
pub struct Registrar<S> {
    store: S,
    hasher: PasswordHasher,
}

impl<S: CredentialStore> Registrar<S> {
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn register(&self, new: NewPrincipal) -> Result<PrincipalProfile, AuthError> {
        new.validate()?;

        let digest = self.hasher.hash(&new.secret)?;
        let principal = Principal::new(new.id, new.identifier, digest, new.display_name, new.role);
        let profile = principal.profile();

        self.store.create(principal).inspect_err(|e| {
            tracing::info!(principal_id = %profile.id, error = %e, "registration rejected");
        })?;

        tracing::info!(principal_id = %profile.id, role = %profile.role, "principal registered");
        Ok(profile)
    }

    /// Validated partial update of identifier, display name or role.
    pub fn update(&self, id: &PrincipalId, patch: PrincipalPatch) -> Result<PrincipalProfile, AuthError> {
        patch.validate()?;
        let updated = self.store.update(id, patch)?;
        tracing::info!(principal_id = %id, "principal updated");
        Ok(updated.profile())
    }

    /// Replace the stored digest. Outstanding tokens stay valid until expiry.
    pub fn change_secret(&self, id: &PrincipalId, secret: &str) -> Result<PrincipalProfile, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::validation("secret must not be empty"));
        }

        let digest = self.hasher.hash(secret)?;
        let updated = self
            .store
            .update(id, PrincipalPatch::default().with_secret_hash(digest))?;

        tracing::info!(principal_id = %id, "secret changed");
        Ok(updated.profile())
    }
}

impl<S> core::fmt::Debug for Registrar<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registrar")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
