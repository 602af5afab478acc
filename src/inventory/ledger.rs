//! Filament stock and production queue ledger
//!
//! Owns stock levels and the queue of designs selected for printing.
//! Every mutation is written through to its persistence region before
//! returning: stock to the long-lived region, the queue to the session one.

use crate::error::SpoolResult;
use crate::inventory::design::{Design, DesignFilament};
use crate::inventory::filament::{DefaultCatalog, Filament};
use crate::inventory::persistence::{PersistenceRegion, Retention};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Material need for one filament of a design, against current stock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
    /// Design's filament ID, else the matched stock record's
    pub filament_id: Option<String>,
    pub color: Option<String>,
    /// Design's swatch, else the matched stock record's
    pub hex: Option<String>,
    /// Grams for one print
    pub needed: f64,
    /// Grams in stock for the matched filament (zero when unmatched)
    pub available: f64,
    /// `max(0, needed - available)`
    pub shortage: f64,
    pub product_url: Option<String>,
}

/// Result of checking a design against stock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub requirements: Vec<Requirement>,
    pub has_shortage: bool,
}

impl Evaluation {
    /// Requirements that cannot be met from stock
    pub fn shortages(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.shortage > 0.0)
    }
}

/// Grams one committed unit actually took from a stock record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDebit {
    pub filament_id: String,
    pub grams: f64,
}

/// A design queued for production
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(flatten)]
    pub design: Design,

    /// Copies queued, at least 1
    pub quantity: u32,

    /// When the slug was first queued
    pub added_at: DateTime<Utc>,

    /// One debit record per committed unit, newest last
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debits: Vec<Vec<UnitDebit>>,
}

impl QueueEntry {
    /// Total print weight for all queued copies
    pub fn total_weight(&self) -> f64 {
        self.design.total_weight() * f64::from(self.quantity)
    }
}

/// Stock and queue ledger
pub struct Ledger {
    stock: Vec<Filament>,
    queue: Vec<QueueEntry>,
    defaults: Vec<Filament>,
    stock_region: Box<dyn PersistenceRegion>,
    queue_region: Box<dyn PersistenceRegion>,
}

impl Ledger {
    /// Load ledger state, seeding stock from the defaults on first use
    pub fn load(
        defaults: &DefaultCatalog,
        stock_region: Box<dyn PersistenceRegion>,
        queue_region: Box<dyn PersistenceRegion>,
    ) -> SpoolResult<Self> {
        let defaults = defaults.filaments().to_vec();

        if queue_region.retention() != Retention::Session {
            warn!("{} region outlives the session", queue_region.name());
        }

        let saved_stock = stock_region
            .load()?
            .and_then(|raw| match serde_json::from_str::<Vec<Filament>>(&raw) {
                Ok(stock) => Some(stock),
                Err(e) => {
                    warn!("Discarding unreadable {} state: {}", stock_region.name(), e);
                    None
                }
            });

        let seeded = saved_stock.is_none();
        let stock = match saved_stock {
            Some(stock) => {
                info!("Loaded {} filaments from {}", stock.len(), stock_region.name());
                stock
            }
            None => {
                info!("Initialized {} using defaults", stock_region.name());
                defaults.clone()
            }
        };

        let queue = queue_region
            .load()?
            .and_then(|raw| match serde_json::from_str::<Vec<QueueEntry>>(&raw) {
                Ok(queue) => Some(queue),
                Err(e) => {
                    warn!("Discarding unreadable {} state: {}", queue_region.name(), e);
                    None
                }
            })
            .unwrap_or_default();

        if !queue.is_empty() {
            info!("Loaded {} queue entries from {}", queue.len(), queue_region.name());
        }

        let ledger = Self {
            stock,
            queue,
            defaults,
            stock_region,
            queue_region,
        };

        if seeded {
            ledger.persist_stock()?;
        }

        Ok(ledger)
    }

    /// Current stock records
    pub fn stock(&self) -> &[Filament] {
        &self.stock
    }

    /// Current production queue
    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    /// Look up a stock record by ID
    pub fn filament(&self, filament_id: &str) -> Option<&Filament> {
        self.stock.iter().find(|f| f.filament_id == filament_id)
    }

    /// Check a design's needs against current stock without mutating anything
    pub fn evaluate(&self, design: &Design) -> Evaluation {
        let requirements: Vec<Requirement> = design
            .filaments
            .iter()
            .map(|need| {
                let matched = self.match_index(need).map(|i| &self.stock[i]);
                let needed = need.weight();
                let available = matched.map(|f| f.stock_grams).unwrap_or(0.0);

                Requirement {
                    filament_id: need
                        .filament_id
                        .clone()
                        .or_else(|| matched.map(|f| f.filament_id.clone())),
                    color: need.color.clone(),
                    hex: need.hex.clone().or_else(|| matched.map(|f| f.hex.clone())),
                    needed,
                    available,
                    shortage: (needed - available).max(0.0),
                    product_url: need.product_url.clone(),
                }
            })
            .collect();

        let has_shortage = requirements.iter().any(|r| r.shortage > 0.0);
        Evaluation {
            requirements,
            has_shortage,
        }
    }

    /// Debit stock for one print of `design` and queue it
    ///
    /// Never blocks on shortage: stock is clamped at zero and the caller
    /// decides beforehand (via [`Ledger::evaluate`]) whether to proceed.
    pub fn commit(&mut self, design: &Design) -> SpoolResult<Evaluation> {
        let evaluation = self.evaluate(design);

        let mut unit = Vec::new();
        for need in &design.filaments {
            if let Some(index) = self.match_index(need) {
                let record = &mut self.stock[index];
                let grams = record.debit(need.weight());
                unit.push(UnitDebit {
                    filament_id: record.filament_id.clone(),
                    grams,
                });
            }
        }

        match self.queue.iter_mut().find(|e| e.design.slug == design.slug) {
            Some(entry) => {
                entry.quantity += 1;
                entry.debits.push(unit);
            }
            None => self.queue.push(QueueEntry {
                design: design.clone(),
                quantity: 1,
                added_at: Utc::now(),
                debits: vec![unit],
            }),
        }

        self.persist_stock()?;
        self.persist_queue()?;
        info!("Saved {} queue entries to {}", self.queue.len(), self.queue_region.name());

        Ok(evaluation)
    }

    /// Return one unit of the entry at `index` to stock and dequeue it
    ///
    /// Returns `false` without touching anything when `index` is out of range.
    pub fn reverse(&mut self, index: usize) -> SpoolResult<bool> {
        let Some(entry) = self.queue.get_mut(index) else {
            return Ok(false);
        };

        let recorded = entry.debits.pop();
        let design = entry.design.clone();

        if entry.quantity > 1 {
            entry.quantity -= 1;
        } else {
            self.queue.remove(index);
        }

        match recorded {
            Some(unit) => {
                for debit in unit {
                    if let Some(record) = self
                        .stock
                        .iter_mut()
                        .find(|f| f.filament_id == debit.filament_id)
                    {
                        record.credit(debit.grams);
                    }
                }
            }
            None => {
                // Entries without debit records get the design weights back
                for need in &design.filaments {
                    if let Some(i) = self.match_index(need) {
                        self.stock[i].credit(need.weight());
                    }
                }
            }
        }

        self.persist_stock()?;
        self.persist_queue()?;
        info!("Updated {}: {} entries", self.queue_region.name(), self.queue.len());

        Ok(true)
    }

    /// Overwrite one filament's stock, clamped at zero
    ///
    /// Returns `false` when no record has that ID.
    pub fn set_stock(&mut self, filament_id: &str, grams: f64) -> SpoolResult<bool> {
        let Some(record) = self.stock.iter_mut().find(|f| f.filament_id == filament_id) else {
            return Ok(false);
        };

        record.set_stock(grams);
        self.persist_stock()?;
        Ok(true)
    }

    /// Restore default stock and drop the whole queue
    pub fn reset(&mut self) -> SpoolResult<()> {
        self.stock = self.defaults.clone();
        self.queue.clear();

        self.persist_stock()?;
        self.queue_region.clear()?;
        info!(
            "Reset {} and {}",
            self.stock_region.name(),
            self.queue_region.name()
        );
        Ok(())
    }

    /// Stock record a design filament draws from
    ///
    /// An ID match anywhere in stock wins; otherwise the first record whose
    /// color equals the requested color, ignoring case.
    fn match_index(&self, need: &DesignFilament) -> Option<usize> {
        need.filament_id
            .as_deref()
            .and_then(|id| self.stock.iter().position(|f| f.filament_id == id))
            .or_else(|| {
                need.color
                    .as_deref()
                    .and_then(|color| self.stock.iter().position(|f| f.color_matches(color)))
            })
    }

    fn persist_stock(&self) -> SpoolResult<()> {
        let json = serde_json::to_string(&self.stock)?;
        self.stock_region.store(&json)
    }

    fn persist_queue(&self) -> SpoolResult<()> {
        let json = serde_json::to_string(&self.queue)?;
        self.queue_region.store(&json)
    }
}
