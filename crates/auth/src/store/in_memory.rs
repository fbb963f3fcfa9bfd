use std::sync::RwLock;

use tollgate_core::PrincipalId;

use super::{CredentialStore, StoreError};
use crate::{Principal, PrincipalPatch};

/// In-memory credential store.
///
/// Intended for tests/dev and as the reference adapter. Records live in a
/// `Vec` so `list` keeps insertion order; every mutation runs under the
/// write lock, which makes check-then-act atomic.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<Vec<Principal>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `principals`, in order.
    pub fn with_principals<I>(principals: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Principal>,
    {
        let store = Self::new();
        for principal in principals {
            store.create(principal)?;
        }
        Ok(store)
    }

    /// Record count. A poisoned lock still reports the records it holds.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn create(&self, principal: Principal) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;

        let taken = records
            .iter()
            .any(|r| r.id == principal.id || r.identifier == principal.identifier);
        if taken {
            return Err(StoreError::AlreadyExists);
        }

        records.push(principal);
        Ok(())
    }

    fn get(&self, id: &PrincipalId) -> Result<Principal, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn list(&self) -> Result<Vec<Principal>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.clone())
    }

    fn update(&self, id: &PrincipalId, patch: PrincipalPatch) -> Result<Principal, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;

        let idx = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(identifier) = &patch.identifier {
            let collides = records
                .iter()
                .enumerate()
                .any(|(i, r)| i != idx && &r.identifier == identifier);
            if collides {
                return Err(StoreError::AlreadyExists);
            }
        }

        let record = &mut records[idx];
        record.apply(patch);
        Ok(record.clone())
    }

    fn delete(&self, id: &PrincipalId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;

        let idx = records
            .iter()
            .position(|r| &r.id == id)
            .ok_or(StoreError::NotFound)?;

        // `remove` (not `swap_remove`) keeps insertion order for `list`.
        records.remove(idx);
        Ok(())
    }

    fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.iter().find(|r| r.identifier == identifier).cloned())
    }
}
