//! Durable image stores
//!
//! Each payload lives in `<key>.bin` with a `<key>.json` metadata record,
//! where the key is the SHA256 of the image URL. Both files are written to
//! a temp sibling and renamed into place, payload first, so a reader sees
//! either a whole payload or a miss.

use crate::error::{SpoolError, SpoolResult};
use crate::images::entry::{CacheEntry, EntryMeta};
use crate::inventory::persistence::temp_sibling;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::debug;

/// Durable key-value store for image payloads, keyed by URL
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read the entry for a URL, valid or not
    async fn get(&self, url: &str) -> SpoolResult<Option<CacheEntry>>;

    /// Insert or replace the entry for its URL
    async fn put(&self, entry: &CacheEntry) -> SpoolResult<()>;

    /// Remove the entry for a URL
    async fn delete(&self, url: &str) -> SpoolResult<()>;

    /// Delete every entry outside the expiry window, returning their URLs
    async fn sweep(&self, now: DateTime<Utc>, expiry: Duration) -> SpoolResult<Vec<String>>;

    /// Human-readable store name for logs
    fn name(&self) -> &'static str;
}

/// Filesystem-backed store
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub async fn open(dir: &Path) -> SpoolResult<Self> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| SpoolError::StoreUnavailable {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let metadata = fs::metadata(dir)
            .await
            .map_err(|e| SpoolError::StoreUnavailable {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        if metadata.permissions().readonly() {
            return Err(SpoolError::StoreUnavailable {
                path: dir.to_path_buf(),
                reason: "directory is read-only".to_string(),
            });
        }

        debug!("Opened image store at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Store root
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn payload_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", key))
    }

    async fn replace(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let temp = temp_sibling(path);
        fs::write(&temp, contents).await?;
        if let Err(e) = fs::rename(&temp, path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn remove_key(&self, key: &str) -> SpoolResult<()> {
        for path in [self.meta_path(key), self.payload_path(key)] {
            if path.exists() {
                fs::remove_file(&path).await.map_err(|e| {
                    SpoolError::io(format!("removing cached image {}", path.display()), e)
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FsStore {
    async fn get(&self, url: &str) -> SpoolResult<Option<CacheEntry>> {
        let key = Self::key(url);
        let meta_path = self.meta_path(&key);

        if !meta_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path).await.map_err(|e| {
            SpoolError::io(format!("reading image metadata {}", meta_path.display()), e)
        })?;
        let meta: EntryMeta = serde_json::from_str(&content)?;

        if meta.url != url {
            return Ok(None);
        }

        let payload_path = self.payload_path(&key);
        if !payload_path.exists() {
            return Ok(None);
        }

        let payload = fs::read(&payload_path).await.map_err(|e| {
            SpoolError::io(format!("reading cached image {}", payload_path.display()), e)
        })?;

        Ok(Some(CacheEntry::captured_at(meta.url, payload, meta.timestamp)))
    }

    async fn put(&self, entry: &CacheEntry) -> SpoolResult<()> {
        let key = Self::key(&entry.url);
        let payload_path = self.payload_path(&key);
        let meta_path = self.meta_path(&key);

        Self::replace(&payload_path, entry.payload.as_slice())
            .await
            .map_err(|e| SpoolError::io(format!("writing cached image {}", payload_path.display()), e))?;

        let meta = serde_json::to_string(&entry.meta())?;
        Self::replace(&meta_path, meta.as_bytes())
            .await
            .map_err(|e| SpoolError::io(format!("writing image metadata {}", meta_path.display()), e))?;

        debug!("Stored {} bytes for {}", entry.payload.len(), entry.url);
        Ok(())
    }

    async fn delete(&self, url: &str) -> SpoolResult<()> {
        self.remove_key(&Self::key(url)).await
    }

    async fn sweep(&self, now: DateTime<Utc>, expiry: Duration) -> SpoolResult<Vec<String>> {
        let mut removed = Vec::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| SpoolError::io("reading image store directory", e))?;

        while let Some(dir_entry) = entries
            .next_entry()
            .await
            .map_err(|e| SpoolError::io("reading image store entry", e))?
        {
            let path = dir_entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            let meta = fs::read_to_string(&path)
                .await
                .ok()
                .and_then(|content| serde_json::from_str::<EntryMeta>(&content).ok());

            match meta {
                Some(meta) if now - meta.timestamp < expiry => {}
                Some(meta) => {
                    self.remove_key(&key).await?;
                    removed.push(meta.url);
                }
                None => {
                    // Unreadable metadata can never produce a hit
                    self.remove_key(&key).await?;
                }
            }
        }

        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

/// In-memory store; clones share contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, url: &str) -> SpoolResult<Option<CacheEntry>> {
        Ok(self.lock().get(url).cloned())
    }

    async fn put(&self, entry: &CacheEntry) -> SpoolResult<()> {
        self.lock().insert(entry.url.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, url: &str) -> SpoolResult<()> {
        self.lock().remove(url);
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>, expiry: Duration) -> SpoolResult<Vec<String>> {
        let mut entries = self.lock();
        let expired: Vec<String> = entries
            .values()
            .filter(|e| !e.is_valid_at(now, expiry))
            .map(|e| e.url.clone())
            .collect();
        for url in &expired {
            entries.remove(url);
        }
        Ok(expired)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
