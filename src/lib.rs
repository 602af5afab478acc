//! Spoolkeeper - filament inventory for 3D print production
//!
//! Browses a remote design catalog, caches design thumbnails in a
//! two-tier image cache, and keeps a filament stock ledger with a
//! production queue.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod inventory;
pub mod ui;

pub use error::{SpoolError, SpoolResult};
