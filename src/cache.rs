//! Content-addressed disk cache for remote call results
//!
//! Memoizes expensive RPC calls across runs: one JSON file per distinct
//! call, named `<name>.<16-hex-fingerprint>.json`, where the fingerprint
//! is a truncated SHA-256 of the serialized argument. Entries live until
//! cleared manually; there is no eviction or TTL.
//!
//! Concurrent workers asking for the same entry are collapsed to a single
//! computation via a per-key async mutex, so a batch never issues
//! duplicate remote calls for one key.

use crate::errors::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hex width of the argument fingerprint (8 bytes of SHA-256). Collisions
/// are negligible at the scale of one contract's call history.
const FINGERPRINT_BYTES: usize = 8;

/// Disk-backed memoization for deterministic remote calls.
pub struct DiskCache {
    dir: PathBuf,
    /// Per-entry locks for in-flight computations.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DiskCache {
    /// Open a cache rooted at `dir`, creating the directory if absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            inflight: Mutex::new(HashMap::new()),
        })
    }

    /// Path of the entry for a (name, key) pair.
    pub fn entry_path<K>(&self, name: &str, key: &K) -> Result<PathBuf, CacheError>
    where
        K: Serialize + ?Sized,
    {
        let raw = serde_json::to_vec(key).map_err(CacheError::Encode)?;
        let digest = Sha256::digest(&raw);
        let fingerprint = hex::encode(&digest[..FINGERPRINT_BYTES]);
        Ok(self.dir.join(format!("{name}.{fingerprint}.json")))
    }

    /// Return the stored result for `(name, key)`, or run `compute`,
    /// store its result, and return it.
    ///
    /// A corrupt stored entry is fatal (`CacheError::Corrupt`); it is not
    /// silently recomputed.
    pub async fn get_or_compute<K, T, E, F, Fut>(
        &self,
        name: &str,
        key: &K,
        compute: F,
    ) -> Result<T, E>
    where
        K: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let path = self.entry_path(name, key)?;
        let lock_key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Single-flight: one computation per entry at a time. The map
        // entry is dropped on every exit path (hit, error, store) so it
        // never outlives the call that created it.
        let lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(lock_key.clone()).or_default().clone()
        };
        let guard = lock.lock().await;
        let result = self.load_or_store(&path, compute).await;
        drop(guard);
        self.inflight.lock().await.remove(&lock_key);
        result
    }

    /// Read the entry stored at `path`, or run `compute` and store its
    /// result. Caller holds the per-entry lock.
    async fn load_or_store<T, E, F, Fut>(&self, path: &Path, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if path.exists() {
            let raw = fs::read(path).map_err(|source| CacheError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let value = serde_json::from_slice(&raw).map_err(|source| CacheError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!("cache hit for {:?}", path);
            return Ok(value);
        }

        let value = compute().await?;
        let raw = serde_json::to_vec(&value).map_err(CacheError::Encode)?;
        fs::write(path, raw).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("cache store for {:?}", path);
        Ok(value)
    }

    /// Number of in-flight lock-map entries (test hook).
    #[cfg(test)]
    pub(crate) async fn inflight_len(&self) -> usize {
        self.inflight.lock().await.len()
    }

    /// Delete every stored entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
