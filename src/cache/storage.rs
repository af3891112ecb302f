//! SQLite-based period storage with file blob support
//!
//! Stores small payloads inline in SQLite, large payloads (>10KB) as files.
//! Entries never expire; closed periods are immutable once written.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use super::PeriodStore;
use super::key::PeriodKey;
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Payloads larger than this are stored as external blobs
const INLINE_THRESHOLD: usize = 10 * 1024; // 10KB

type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed period storage with file blob support
pub struct CacheStorage {
    conn: Mutex<Connection>,
    blobs_dir: PathBuf,
}

impl CacheStorage {
    /// Get the cache directory path (~/.cache/windstat on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("windstat"))
    }

    /// Open storage at a specific directory
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let blobs_dir = cache_dir.join("blobs");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create blobs dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path, &blobs_dir)?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS period_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                data BLOB,
                blob_path TEXT,
                digest TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            blobs_dir,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Database("cache connection lock poisoned".to_string()))
    }

    /// Get a stored payload, verifying it against its digest
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;

        let row: Option<(Option<Vec<u8>>, Option<String>, String)> = conn
            .query_row(
                "SELECT data, blob_path, digest FROM period_entries WHERE cache_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (data, digest) = match row {
            Some((Some(data), None, digest)) => (data, digest),
            Some((None, Some(blob_path), digest)) => {
                match std::fs::read(self.blobs_dir.join(&blob_path)) {
                    Ok(data) => (data, digest),
                    Err(e) => {
                        log::warn!("Failed to read blob {}: {}", blob_path, e);
                        conn.execute("DELETE FROM period_entries WHERE cache_key = ?1", [key])?;
                        return Ok(None);
                    }
                }
            }
            _ => return Ok(None),
        };

        if payload_digest(&data) != digest {
            log::warn!("Digest mismatch for cache entry {}, discarding", key);
            conn.execute("DELETE FROM period_entries WHERE cache_key = ?1", [key])?;
            return Ok(None);
        }

        Ok(Some(data))
    }

    /// Store a payload under `key`
    pub fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let now = Utc::now().timestamp();
        let digest = payload_digest(data);

        if data.len() <= INLINE_THRESHOLD {
            let conn = self.conn()?;
            let previous_blob = Self::blob_path_of(&conn, key)?;
            conn.execute(
                "INSERT OR REPLACE INTO period_entries
                 (cache_key, data, blob_path, digest, created_at, size_bytes)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
                params![key, data, digest, now, data.len()],
            )?;
            if let Some(path) = previous_blob {
                self.remove_blob(&path);
            }
        } else {
            // Blob goes to disk before the row that points at it
            let blob_path = self.write_blob(key, data)?;
            let conn = self.conn()?;
            conn.execute(
                "INSERT OR REPLACE INTO period_entries
                 (cache_key, data, blob_path, digest, created_at, size_bytes)
                 VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
                params![key, blob_path, digest, now, data.len()],
            )?;
        }
        Ok(())
    }

    /// Delete a specific entry by key. Returns whether a row was removed.
    pub fn delete_by_key(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let blob_path = Self::blob_path_of(&conn, key)?;

        let deleted = conn.execute("DELETE FROM period_entries WHERE cache_key = ?1", [key])?;

        if let Some(path) = blob_path {
            self.remove_blob(&path);
        }

        Ok(deleted > 0)
    }

    /// Blob file currently backing `key`, if it is stored as one
    fn blob_path_of(conn: &Connection, key: &str) -> Result<Option<String>> {
        let blob_path: Option<Option<String>> = conn
            .query_row(
                "SELECT blob_path FROM period_entries WHERE cache_key = ?1",
                [key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(blob_path.flatten())
    }

    fn remove_blob(&self, path: &str) {
        if let Err(e) = std::fs::remove_file(self.blobs_dir.join(path)) {
            log::warn!("Failed to remove blob {}: {}", path, e);
        }
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM period_entries", [], |r| r.get(0))?;

        conn.execute("DELETE FROM period_entries", [])?;

        if self.blobs_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.blobs_dir) {
                log::warn!("Failed to clear blobs directory: {}", e);
            }
            std::fs::create_dir_all(&self.blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        }

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;

        let (total, monthly, yearly, daily, snapshots, size, oldest, newest): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
            Option<i64>,
            Option<i64>,
        ) = conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN cache_key LIKE 'monthly-%' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN cache_key LIKE 'yearly-%' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN length(cache_key) = 6 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN length(cache_key) = 4 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(size_bytes), 0),
                MIN(created_at),
                MAX(created_at)
             FROM period_entries",
            [],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                ))
            },
        )?;

        Ok(CacheStats {
            total_entries: total as usize,
            monthly_entries: monthly as usize,
            yearly_entries: yearly as usize,
            daily_entries: daily as usize,
            snapshot_entries: snapshots as usize,
            total_size_bytes: size as usize,
            oldest_entry: oldest,
            newest_entry: newest,
        })
    }

    /// Write a blob file, sharded by first 2 chars of key
    fn write_blob(&self, key: &str, data: &[u8]) -> Result<String> {
        let shard = &key[..2.min(key.len())];
        let shard_dir = self.blobs_dir.join(shard);
        std::fs::create_dir_all(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create shard dir: {}", e)))?;

        let filename = format!("{}.json", key);
        let rel_path = format!("{}/{}", shard, filename);
        let full_path = shard_dir.join(&filename);
        let tmp_path = shard_dir.join(format!("{}.tmp", filename));

        std::fs::write(&tmp_path, data)
            .map_err(|e| CacheError::Io(format!("Failed to write blob: {}", e)))?;
        std::fs::rename(&tmp_path, &full_path)
            .map_err(|e| CacheError::Io(format!("Failed to move blob into place: {}", e)))?;

        Ok(rel_path)
    }

    /// Nuke the cache (delete DB and all blobs)
    fn nuke(db_path: &Path, blobs_dir: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        if blobs_dir.exists() {
            std::fs::remove_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to remove blobs dir: {}", e)))?;
        }
        Ok(())
    }
}

impl PeriodStore for CacheStorage {
    fn lookup(&self, key: &PeriodKey) -> Result<Option<Vec<u8>>> {
        self.get(key.as_str())
    }

    fn insert(&self, key: &PeriodKey, payload: &[u8]) -> Result<()> {
        self.put(key.as_str(), payload)
    }

    fn delete(&self, key: &PeriodKey) -> Result<()> {
        self.delete_by_key(key.as_str()).map(|_| ())
    }
}

fn payload_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub monthly_entries: usize,
    pub yearly_entries: usize,
    pub daily_entries: usize,
    pub snapshot_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<i64>,
    pub newest_entry: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_storage() -> (CacheStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = CacheStorage::open_at(dir.path()).unwrap();
        (storage, dir)
    }

    #[test]
    fn test_put_get_inline() {
        let (storage, _dir) = test_storage();
        let data = b"small data";

        storage.put("monthly-202404", data).unwrap();

        let result = storage.get("monthly-202404").unwrap();
        assert_eq!(result, Some(data.to_vec()));
    }

    #[test]
    fn test_put_get_blob() {
        let (storage, _dir) = test_storage();
        let data = vec![b'x'; 20_000]; // 20KB - will use blob

        storage.put("2024", &data).unwrap();

        let result = storage.get("2024").unwrap();
        assert_eq!(result, Some(data));
    }

    #[test]
    fn test_entries_do_not_expire() {
        let (storage, dir) = test_storage();
        storage.put("yearly-2023", b"{}").unwrap();
        drop(storage);

        // Reopening the same directory sees the same entry
        let reopened = CacheStorage::open_at(dir.path()).unwrap();
        assert_eq!(reopened.get("yearly-2023").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_miss_returns_none() {
        let (storage, _dir) = test_storage();
        assert_eq!(storage.get("monthly-199901").unwrap(), None);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (storage, _dir) = test_storage();
        storage.put("250614", b"window").unwrap();

        assert!(storage.delete_by_key("250614").unwrap());
        assert!(!storage.delete_by_key("250614").unwrap());
        assert!(storage.get("250614").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_blob_file() {
        let (storage, dir) = test_storage();
        let data = vec![b'y'; 20_000];
        storage.put("250614", &data).unwrap();

        let blob = dir.path().join("blobs").join("25").join("250614.json");
        assert!(blob.exists());

        storage.delete_by_key("250614").unwrap();
        assert!(!blob.exists());
    }

    #[test]
    fn test_inline_rewrite_removes_old_blob() {
        let (storage, dir) = test_storage();
        storage.put("monthly-202404", &vec![b'z'; 20_000]).unwrap();

        let blob = dir.path().join("blobs").join("mo").join("monthly-202404.json");
        assert!(blob.exists());

        storage.put("monthly-202404", b"{\"data\":[]}").unwrap();
        assert!(!blob.exists());
        assert_eq!(
            storage.get("monthly-202404").unwrap(),
            Some(b"{\"data\":[]}".to_vec())
        );
    }

    #[test]
    fn test_corrupted_blob_reads_as_miss() {
        let (storage, dir) = test_storage();
        let data = vec![b'z'; 20_000];
        storage.put("2023", &data).unwrap();

        let blob = dir.path().join("blobs").join("20").join("2023.json");
        std::fs::write(&blob, b"truncated").unwrap();

        assert_eq!(storage.get("2023").unwrap(), None);
        // The bad row is gone, so the next lookup is a clean miss too
        assert_eq!(storage.get("2023").unwrap(), None);
    }

    #[test]
    fn test_missing_blob_reads_as_miss() {
        let (storage, dir) = test_storage();
        storage.put("2022", &vec![b'a'; 20_000]).unwrap();
        std::fs::remove_file(dir.path().join("blobs").join("20").join("2022.json")).unwrap();

        assert_eq!(storage.get("2022").unwrap(), None);
    }

    #[test]
    fn test_clear_all() {
        let (storage, _dir) = test_storage();

        storage.put("monthly-202401", b"d1").unwrap();
        storage.put("monthly-202402", b"d2").unwrap();

        let stats = storage.clear_all().unwrap();
        assert_eq!(stats.entries_removed, 2);

        assert!(storage.get("monthly-202401").unwrap().is_none());
        assert!(storage.get("monthly-202402").unwrap().is_none());
    }

    #[test]
    fn test_stats_by_kind() {
        let (storage, _dir) = test_storage();

        storage.put("monthly-202401", b"m").unwrap();
        storage.put("monthly-202402", b"m").unwrap();
        storage.put("yearly-2023", b"y").unwrap();
        storage.put("250614", b"d").unwrap();
        storage.put("2023", b"s").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 5);
        assert_eq!(stats.monthly_entries, 2);
        assert_eq!(stats.yearly_entries, 1);
        assert_eq!(stats.daily_entries, 1);
        assert_eq!(stats.snapshot_entries, 1);
        assert!(stats.total_size_bytes > 0);
        assert!(stats.oldest_entry.is_some());
    }

    #[test]
    fn test_stats_empty() {
        let (storage, _dir) = test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.oldest_entry, None);
    }

    #[test]
    fn test_period_store_trait() {
        let (storage, _dir) = test_storage();
        let key = PeriodKey::monthly(2024, 4);

        storage.insert(&key, b"payload").unwrap();
        assert_eq!(storage.lookup(&key).unwrap(), Some(b"payload".to_vec()));

        storage.delete(&key).unwrap();
        storage.delete(&key).unwrap();
        assert_eq!(storage.lookup(&key).unwrap(), None);
    }
}
