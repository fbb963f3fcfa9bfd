//! Credential store contract.
//!
//! Pure data access: uniqueness of ids and identifiers is enforced here,
//! policy is not. Implementations must make each check-then-act sequence
//! (existence check plus insert/update/delete) atomic.

mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use tollgate_core::{AuthError, PrincipalId};

use crate::{Principal, PrincipalPatch};

pub use in_memory::InMemoryCredentialStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("principal not found")]
    NotFound,

    #[error("principal already exists")]
    AlreadyExists,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::AlreadyExists => AuthError::AlreadyExists,
            StoreError::Unavailable(msg) => AuthError::Internal(msg),
        }
    }
}

pub trait CredentialStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the id or the
    /// identifier is taken.
    fn create(&self, principal: Principal) -> Result<(), StoreError>;

    fn get(&self, id: &PrincipalId) -> Result<Principal, StoreError>;

    /// All records in insertion order.
    fn list(&self) -> Result<Vec<Principal>, StoreError>;

    /// Merge `patch` into the record and return the result. The id is
    /// preserved; moving to an identifier held by another record fails with
    /// `AlreadyExists`.
    fn update(&self, id: &PrincipalId, patch: PrincipalPatch) -> Result<Principal, StoreError>;

    fn delete(&self, id: &PrincipalId) -> Result<(), StoreError>;

    /// Exact-match lookup by login identifier.
    fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, StoreError>;
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn create(&self, principal: Principal) -> Result<(), StoreError> {
        (**self).create(principal)
    }

    fn get(&self, id: &PrincipalId) -> Result<Principal, StoreError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<Principal>, StoreError> {
        (**self).list()
    }

    fn update(&self, id: &PrincipalId, patch: PrincipalPatch) -> Result<Principal, StoreError> {
        (**self).update(id, patch)
    }

    fn delete(&self, id: &PrincipalId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        (**self).find_by_identifier(identifier)
    }
}
