//! Configuration schema for spoolkeeper
//!
//! Configuration is stored at `~/.config/spoolkeeper/config.toml`

use crate::catalog::LIBRARY_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote design catalog settings
    pub catalog: CatalogConfig,

    /// Image cache settings
    pub images: ImagesConfig,

    /// Filament inventory settings
    pub inventory: InventoryConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Remote design catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the designs API
    pub base_url: String,

    /// Static bearer credential
    pub api_key: Option<String>,

    /// Locale passed to batch requests
    pub locale: String,

    /// Slugs per batch request (capped at 20 by the API)
    pub batch_size: usize,

    /// Designs pulled from the listing endpoint
    pub total_designs: u32,

    /// Designs shown per page
    pub page_size: usize,

    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://n3dmelbourne.com/api/v1".to_string(),
            api_key: None,
            locale: "US".to_string(),
            batch_size: 20,
            total_designs: 50,
            page_size: LIBRARY_PAGE_SIZE,
            timeout_secs: 0,
        }
    }
}

impl CatalogConfig {
    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Image cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Keep fetched images in the on-disk store
    pub durable: bool,

    /// Days before a cached image must be re-fetched
    pub expiry_days: u32,

    /// Debounce window for batched image diagnostics
    pub flush_debounce_ms: u64,

    /// Override the on-disk store location
    pub cache_dir: Option<PathBuf>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            durable: true,
            expiry_days: 7,
            flush_debounce_ms: 500,
            cache_dir: None,
        }
    }
}

impl ImagesConfig {
    /// Expiry window as a chrono duration
    pub fn expiry(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.expiry_days))
    }

    /// Diagnostics debounce window
    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }
}

/// Filament inventory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Stock under this many grams is flagged as low
    pub low_stock_grams: f64,

    /// Override the long-lived state directory (stock levels)
    pub state_dir: Option<PathBuf>,

    /// Override the session directory (production queue)
    pub session_dir: Option<PathBuf>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_grams: 50.0,
            state_dir: None,
            session_dir: None,
        }
    }
}
