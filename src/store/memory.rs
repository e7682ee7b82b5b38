use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use super::store::{Credential, CredentialStore, StoreError};

/// In-memory credential store
///
/// Reference implementation of [`CredentialStore`] over an ordered map,
/// used by the test suite and suitable for embedding in tools that do
/// not need durable persistence. Mutation counters expose how many
/// writes a scenario performed, which the rotation tests use to prove
/// idempotence.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Credential>>,
    puts: AtomicU64,
    updates: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total successful `put` calls
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Total successful `update` calls
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(username).cloned())
    }

    fn put(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&credential.username) {
            return Err(StoreError::Conflict);
        }
        records.insert(credential.username.clone(), credential);
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn update(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.get_mut(&credential.username) {
            Some(existing) => {
                *existing = credential;
                self.updates.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn scan_from(&self, after: Option<&str>, limit: usize) -> Result<Vec<Credential>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let lower = match after {
            Some(username) => Bound::Excluded(username.to_string()),
            None => Bound::Unbounded,
        };
        Ok(records
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, credential)| credential.clone())
            .collect())
    }
}
