//! Two-tier image cache
//!
//! Resolution order for a URL:
//!
//! | Tier | Hit | Miss |
//! |------|-----|------|
//! | In-process map | return, counted as cached | fall through |
//! | Durable store | promote to map, counted as cached | fall through |
//! | Network | populate both tiers, counted as fetched | fall back to the raw URL |
//!
//! An entry is only served while it is younger than the expiry window. When
//! the durable store cannot be opened the map is the only tier for the rest
//! of the process and callers never see an error for it.

use crate::config::schema::ImagesConfig;
use crate::images::diagnostics::Diagnostics;
use crate::images::entry::{default_expiry, CacheEntry};
use crate::images::fetcher::{failure_reason, ImageFetcher};
use crate::images::store::{DurableStore, FsStore};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Error reported when there is no URL to resolve
pub const NO_URL_ERROR: &str = "No URL provided";

/// Diagnostic text recorded for a design with no image URL
pub const NO_URL_DIAGNOSTIC: &str = "No image URL in API response";

/// A displayable image resource
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Image bytes held in memory
    Bytes(Arc<Vec<u8>>),
    /// The original remote URL, for the renderer to try directly
    Url(String),
}

/// Observable state of one image resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ImageState {
    pub source: Option<ImageSource>,
    pub loading: bool,
    pub from_cache: bool,
    pub error: Option<String>,
}

impl ImageState {
    /// Resolution in progress
    pub fn pending() -> Self {
        Self {
            source: None,
            loading: true,
            from_cache: false,
            error: None,
        }
    }

    fn missing_url() -> Self {
        Self {
            source: None,
            loading: false,
            from_cache: false,
            error: Some(NO_URL_ERROR.to_string()),
        }
    }

    fn loaded(payload: Arc<Vec<u8>>, from_cache: bool) -> Self {
        Self {
            source: Some(ImageSource::Bytes(payload)),
            loading: false,
            from_cache,
            error: None,
        }
    }

    fn fallback(url: &str, error: String) -> Self {
        Self {
            source: Some(ImageSource::Url(url.to_string())),
            loading: false,
            from_cache: false,
            error: Some(error),
        }
    }

    /// Resolution that never finished, falling back to the raw URL if any
    pub(crate) fn interrupted(url: Option<&str>, error: String) -> Self {
        match url {
            Some(url) => Self::fallback(url, error),
            None => Self {
                source: None,
                loading: false,
                from_cache: false,
                error: Some(error),
            },
        }
    }

    /// Whether resolution produced an error (a fallback source may still exist)
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Shared two-tier image cache service
pub struct ImageCache {
    memory: RwLock<HashMap<String, CacheEntry>>,
    store: Option<Arc<dyn DurableStore>>,
    fetcher: Arc<dyn ImageFetcher>,
    diagnostics: Diagnostics,
    expiry: Duration,
}

impl ImageCache {
    /// Create a memory-only cache
    pub fn new(fetcher: Arc<dyn ImageFetcher>, diagnostics: Diagnostics) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            store: None,
            fetcher,
            diagnostics,
            expiry: default_expiry(),
        }
    }

    /// Attach a durable tier
    pub fn with_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the expiry window
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Build the cache from configuration and run the expiry sweep
    ///
    /// An unusable store directory degrades to memory-only caching.
    pub async fn open(
        config: &ImagesConfig,
        dir: &Path,
        fetcher: Arc<dyn ImageFetcher>,
        diagnostics: Diagnostics,
    ) -> Self {
        let mut cache = Self::new(fetcher, diagnostics).with_expiry(config.expiry());

        if config.durable {
            match FsStore::open(dir).await {
                Ok(store) => cache = cache.with_store(Arc::new(store)),
                Err(e) => warn!("Image store unavailable, using memory cache: {}", e),
            }
        }

        cache.sweep_expired().await;
        cache
    }

    /// Whether a durable tier is attached
    pub fn is_durable(&self) -> bool {
        self.store.is_some()
    }

    /// Diagnostics aggregator used by this cache
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Resolve a URL to a displayable image
    ///
    /// Never fails: a missing URL or a failed fetch is reported in the
    /// returned state (and in diagnostics), with the raw URL as fallback
    /// source when there is one.
    pub async fn resolve(&self, url: Option<&str>, label: Option<&str>) -> ImageState {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            self.diagnostics
                .record_failure(label, "(none)", NO_URL_DIAGNOSTIC);
            return ImageState::missing_url();
        };

        if let Some(payload) = self.lookup(url).await {
            self.diagnostics.record_cached();
            return ImageState::loaded(payload, true);
        }

        match self.fetcher.fetch(url).await {
            Ok(bytes) => {
                let entry = CacheEntry::new(url, bytes);
                let payload = Arc::clone(&entry.payload);
                self.populate(entry).await;
                self.diagnostics.record_fetched();
                ImageState::loaded(payload, false)
            }
            Err(e) => {
                let reason = failure_reason(&e);
                debug!("Fetch failed for {}: {}", url, reason);
                self.diagnostics.record_failure(label, url, &reason);
                ImageState::fallback(url, reason)
            }
        }
    }

    /// Find a valid cached payload without touching the network
    pub async fn lookup(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        let now = Utc::now();

        if let Some(entry) = self.read_memory().get(url) {
            if entry.is_valid_at(now, self.expiry) {
                return Some(Arc::clone(&entry.payload));
            }
        }

        let store = self.store.as_ref()?;
        let entry = match store.get(url).await {
            Ok(Some(entry)) if entry.is_valid_at(now, self.expiry) => entry,
            Ok(Some(_)) => {
                if let Err(e) = store.delete(url).await {
                    debug!("Could not drop expired image {}: {}", url, e);
                }
                return None;
            }
            Ok(None) => return None,
            Err(e) => {
                debug!("Image store read failed for {}: {}", url, e);
                return None;
            }
        };

        let payload = Arc::clone(&entry.payload);
        self.write_memory().insert(url.to_string(), entry);
        Some(payload)
    }

    /// Delete expired entries from both tiers, returning how many went
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;

        if let Some(store) = &self.store {
            match store.sweep(now, self.expiry).await {
                Ok(urls) => {
                    let mut memory = self.write_memory();
                    for url in &urls {
                        memory.remove(url);
                    }
                    removed += urls.len();
                }
                Err(e) => warn!("Image store sweep failed: {}", e),
            }
        }

        {
            let mut memory = self.write_memory();
            let before = memory.len();
            memory.retain(|_, entry| entry.is_valid_at(now, self.expiry));
            removed += before - memory.len();
        }

        if removed > 0 {
            info!("Removed {} expired images", removed);
        }
        removed
    }

    /// Number of entries in the in-process tier
    pub fn memory_len(&self) -> usize {
        self.read_memory().len()
    }

    async fn populate(&self, entry: CacheEntry) {
        if let Some(store) = &self.store {
            if let Err(e) = store.put(&entry).await {
                warn!("Failed to persist image {}: {}", entry.url, e);
            }
        }
        // Last write wins for concurrent fetches of the same URL
        self.write_memory().insert(entry.url.clone(), entry);
    }

    fn read_memory(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.memory.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_memory(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.memory.write().unwrap_or_else(|e| e.into_inner())
    }
}
