//! Image caching
//!
//! Design thumbnails are resolved through a two-tier cache: an in-process
//! map in front of a durable on-disk store, with network fetches on a full
//! miss. Load outcomes are aggregated into debounced diagnostics reports.

pub mod cache;
pub mod diagnostics;
pub mod entry;
pub mod fetcher;
pub mod store;
pub mod subscription;

pub use cache::{ImageCache, ImageSource, ImageState};
pub use diagnostics::{
    CollectingSink, Diagnostics, DiagnosticsReport, DiagnosticsSink, ImageFailure, TracingSink,
};
pub use entry::{default_expiry, CacheEntry, EntryMeta};
pub use fetcher::{HttpFetcher, ImageFetcher};
pub use store::{DurableStore, FsStore, MemoryStore};
pub use subscription::{ImageStatus, ImageSubscription};
