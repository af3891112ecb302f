//! In-memory period store
//!
//! Used for `--no-cache` runs, where nothing should touch disk but a single
//! invocation still benefits from reusing the months it already computed.

use std::collections::HashMap;
use std::sync::Mutex;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::PeriodStore;
use super::key::PeriodKey;
use crate::error::CacheError;

/// Process-local key→blob map
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    #[cfg(test)]
    inserts: AtomicUsize,
    #[cfg(test)]
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Database("memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn check_writable(&self) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Database("store rejected write".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_writable(&self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Whether `key` is present
    #[cfg(test)]
    pub fn contains(&self, key: &PeriodKey) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(key.as_str()))
            .unwrap_or(false)
    }

    /// Number of successful inserts since creation
    #[cfg(test)]
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of stored entries
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Make every insert and delete fail from now on
    #[cfg(test)]
    pub fn reject_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl PeriodStore for MemoryStore {
    fn lookup(&self, key: &PeriodKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries()?.get(key.as_str()).cloned())
    }

    fn insert(&self, key: &PeriodKey, payload: &[u8]) -> Result<(), CacheError> {
        self.check_writable()?;
        self.entries()?
            .insert(key.as_str().to_string(), payload.to_vec());
        #[cfg(test)]
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, key: &PeriodKey) -> Result<(), CacheError> {
        self.check_writable()?;
        self.entries()?.remove(key.as_str());
        Ok(())
    }
}
