//! Filament inventory ledger
//!
//! Tracks filament stock, the queue of designs selected for printing, and
//! per-design shortages. Stock persists across restarts; the queue lives
//! only as long as the session.

pub mod design;
pub mod filament;
pub mod ledger;
pub mod persistence;

pub use design::{Design, DesignFilament};
pub use filament::{DefaultCatalog, Filament, Series, FALLBACK_HEX};
pub use ledger::{Evaluation, Ledger, QueueEntry, Requirement, UnitDebit};
pub use persistence::{FileRegion, MemoryRegion, PersistenceRegion, Retention};
