//! CLI command implementations

pub mod config;
pub mod designs;
pub mod image;
pub mod queue;
pub mod stock;

pub use config::execute as config;
pub use designs::execute as designs;
pub use image::execute as image;
pub use queue::execute as queue;
pub use stock::execute as stock;

use crate::config::{Config, ConfigManager};
use crate::error::SpoolResult;
use crate::images::{Diagnostics, HttpFetcher, ImageCache, TracingSink};
use crate::inventory::{DefaultCatalog, FileRegion, Ledger};
use std::sync::Arc;

/// Open the ledger over the configured state files
pub(crate) fn open_ledger(config: &Config) -> SpoolResult<Ledger> {
    let defaults = DefaultCatalog::bundled()?;
    Ledger::load(
        &defaults,
        Box::new(FileRegion::long_lived(ConfigManager::stock_path(config))),
        Box::new(FileRegion::session(
            ConfigManager::queue_path(config),
            ConfigManager::session_id(),
        )),
    )
}

/// Open the image cache with the HTTP fetcher and tracing diagnostics
pub(crate) async fn open_image_cache(config: &Config) -> Arc<ImageCache> {
    let fetcher = Arc::new(HttpFetcher::new(config.catalog.timeout()));
    let diagnostics = Diagnostics::new(Arc::new(TracingSink), config.images.flush_debounce());
    let cache = ImageCache::open(
        &config.images,
        &ConfigManager::images_path(config),
        fetcher,
        diagnostics,
    )
    .await;
    Arc::new(cache)
}

/// Grams as shown in listings
pub(crate) fn grams(value: f64) -> String {
    format!("{:.1}g", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::PersistenceRegion;
    use tempfile::TempDir;

    fn isolated_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.inventory.state_dir = Some(temp.path().join("state"));
        config.inventory.session_dir = Some(temp.path().join("session"));
        config.images.cache_dir = Some(temp.path().join("images"));
        config
    }

    #[tokio::test]
    async fn open_ledger_seeds_bundled_stock() {
        let temp = TempDir::new().unwrap();
        let config = isolated_config(&temp);
        ConfigManager::ensure_state_dirs(&config).await.unwrap();

        let ledger = open_ledger(&config).unwrap();

        assert_eq!(ledger.stock().len(), 24);
        assert!(ledger.queue().is_empty());
        assert!(ConfigManager::stock_path(&config).exists());
    }

    #[tokio::test]
    async fn open_ledger_drops_queue_from_another_session() {
        let temp = TempDir::new().unwrap();
        let config = isolated_config(&temp);
        ConfigManager::ensure_state_dirs(&config).await.unwrap();

        let queue = r#"[{"slug":"bust","title":"Bust","filaments":[],"quantity":1,"added_at":"2026-01-05T10:00:00Z"}]"#;
        FileRegion::session(ConfigManager::queue_path(&config), "an-earlier-login")
            .store(queue)
            .unwrap();

        let ledger = open_ledger(&config).unwrap();
        assert!(ledger.queue().is_empty());
    }

    #[tokio::test]
    async fn open_ledger_keeps_queue_within_a_session() {
        let temp = TempDir::new().unwrap();
        let config = isolated_config(&temp);
        ConfigManager::ensure_state_dirs(&config).await.unwrap();

        let queue = r#"[{"slug":"bust","title":"Bust","filaments":[],"quantity":1,"added_at":"2026-01-05T10:00:00Z"}]"#;
        FileRegion::session(ConfigManager::queue_path(&config), ConfigManager::session_id())
            .store(queue)
            .unwrap();

        let ledger = open_ledger(&config).unwrap();
        assert_eq!(ledger.queue().len(), 1);
    }

    #[tokio::test]
    async fn open_image_cache_uses_configured_dir() {
        let temp = TempDir::new().unwrap();
        let config = isolated_config(&temp);

        let cache = open_image_cache(&config).await;

        assert!(cache.is_durable());
        assert!(temp.path().join("images").is_dir());
    }

    #[test]
    fn grams_has_one_decimal() {
        assert_eq!(grams(120.0), "120.0g");
        assert_eq!(grams(42.26), "42.3g");
    }
}
