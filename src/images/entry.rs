//! Cached image records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default time a cached image stays valid
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Default expiry window
pub fn default_expiry() -> Duration {
    Duration::days(DEFAULT_EXPIRY_DAYS)
}

/// An image payload captured at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Source URL, the cache key
    pub url: String,

    /// Raw image bytes
    pub payload: Arc<Vec<u8>>,

    /// When the payload was captured
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Capture a payload now
    pub fn new(url: impl Into<String>, payload: Vec<u8>) -> Self {
        Self::captured_at(url, payload, Utc::now())
    }

    /// Capture a payload at an explicit time
    pub fn captured_at(url: impl Into<String>, payload: Vec<u8>, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            payload: Arc::new(payload),
            timestamp,
        }
    }

    /// Whether the entry is still inside the expiry window at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.timestamp < expiry
    }

    /// Metadata record written next to the payload on disk
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            url: self.url.clone(),
            timestamp: self.timestamp,
            size_bytes: self.payload.len() as u64,
        }
    }
}

/// On-disk metadata for a stored payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_valid() {
        let entry = CacheEntry::new("https://cdn.example.com/a.png", vec![1, 2, 3]);
        assert!(entry.is_valid_at(Utc::now(), default_expiry()));
    }

    #[test]
    fn entry_expires_after_window() {
        let now = Utc::now();
        let old = CacheEntry::captured_at("u", vec![], now - Duration::days(8));
        let edge = CacheEntry::captured_at("u", vec![], now - Duration::days(7));
        let young = CacheEntry::captured_at("u", vec![], now - Duration::days(6));

        assert!(!old.is_valid_at(now, default_expiry()));
        assert!(!edge.is_valid_at(now, default_expiry()));
        assert!(young.is_valid_at(now, default_expiry()));
    }

    #[test]
    fn meta_reports_size() {
        let entry = CacheEntry::new("u", vec![0; 42]);
        assert_eq!(entry.meta().size_bytes, 42);
        assert_eq!(entry.meta().url, "u");
    }
}
