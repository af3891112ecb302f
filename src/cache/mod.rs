//! Period cache
//!
//! A durable key→blob map holding closed-period aggregates and raw daily
//! windows. SQLite-backed with file blob storage for large payloads, plus an
//! in-memory variant for `--no-cache` runs.

pub mod key;
pub mod memory;
pub mod storage;

use crate::error::CacheError;

/// Key→blob store consulted by the aggregators.
///
/// A lookup returns either the complete payload of an earlier insert or a
/// miss. Deleting an absent key is not an error.
pub trait PeriodStore: Send + Sync {
    fn lookup(&self, key: &PeriodKey) -> Result<Option<Vec<u8>>, CacheError>;

    fn insert(&self, key: &PeriodKey, payload: &[u8]) -> Result<(), CacheError>;

    fn delete(&self, key: &PeriodKey) -> Result<(), CacheError>;
}

impl<S: PeriodStore + ?Sized> PeriodStore for std::sync::Arc<S> {
    fn lookup(&self, key: &PeriodKey) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).lookup(key)
    }

    fn insert(&self, key: &PeriodKey, payload: &[u8]) -> Result<(), CacheError> {
        (**self).insert(key, payload)
    }

    fn delete(&self, key: &PeriodKey) -> Result<(), CacheError> {
        (**self).delete(key)
    }
}

// Re-export main types
pub use key::PeriodKey;
pub use memory::MemoryStore;
pub use storage::CacheStorage;
