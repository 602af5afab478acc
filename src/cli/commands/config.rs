//! Config command - show or edit configuration

use crate::catalog::MAX_BATCH;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SpoolError, SpoolResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "catalog.base_url",
    "catalog.api_key",
    "catalog.locale",
    "catalog.batch_size",
    "catalog.total_designs",
    "catalog.page_size",
    "catalog.timeout_secs",
    "images.durable",
    "images.expiry_days",
    "images.flush_debounce_ms",
    "images.cache_dir",
    "inventory.low_stock_grams",
    "inventory.state_dir",
    "inventory.session_dir",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    ctx: &UiContext,
) -> SpoolResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force, ctx).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut updated = config.clone();
            if let Err(e) = apply_setting(&mut updated, &key, &value) {
                if matches!(e, SpoolError::User(ref msg) if msg.starts_with("Unknown")) {
                    ui::remark(ctx, "Valid keys:");
                    for key in VALID_KEYS {
                        eprintln!("  {}", key);
                    }
                }
                return Err(e);
            }
            manager.save(&updated).await?;
            let shown = if key == "catalog.api_key" { "********" } else { value.as_str() };
            ui::step_ok(ctx, &format!("Set {} = {}", key, shown));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> SpoolResult<()> {
    let mut shown = config.clone();
    if shown.catalog.api_key.is_some() {
        shown.catalog.api_key = Some("********".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool, ctx: &UiContext) -> SpoolResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Apply one dotted `key = value` setting
fn apply_setting(config: &mut Config, key: &str, value: &str) -> SpoolResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(SpoolError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },

        ["catalog", "base_url"] => config.catalog.base_url = value.to_string(),
        ["catalog", "api_key"] => config.catalog.api_key = optional(value),
        ["catalog", "locale"] => config.catalog.locale = value.to_string(),
        ["catalog", "batch_size"] => {
            let size: usize = parse_number(value)?;
            if size == 0 || size > MAX_BATCH {
                return Err(SpoolError::User(format!(
                    "batch_size must be between 1 and {}",
                    MAX_BATCH
                )));
            }
            config.catalog.batch_size = size;
        }
        ["catalog", "total_designs"] => config.catalog.total_designs = parse_number(value)?,
        ["catalog", "page_size"] => config.catalog.page_size = parse_number(value)?,
        ["catalog", "timeout_secs"] => config.catalog.timeout_secs = parse_number(value)?,

        ["images", "durable"] => config.images.durable = parse_bool(value)?,
        ["images", "expiry_days"] => config.images.expiry_days = parse_number(value)?,
        ["images", "flush_debounce_ms"] => config.images.flush_debounce_ms = parse_number(value)?,
        ["images", "cache_dir"] => config.images.cache_dir = optional(value).map(PathBuf::from),

        ["inventory", "low_stock_grams"] => {
            config.inventory.low_stock_grams = parse_number::<f64>(value)?.max(0.0)
        }
        ["inventory", "state_dir"] => config.inventory.state_dir = optional(value).map(PathBuf::from),
        ["inventory", "session_dir"] => {
            config.inventory.session_dir = optional(value).map(PathBuf::from)
        }

        _ => return Err(SpoolError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

/// Empty string clears an optional setting
fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(value: &str) -> SpoolResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(SpoolError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str) -> SpoolResult<T> {
    value
        .parse()
        .map_err(|_| SpoolError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn every_valid_key_is_settable() {
        for key in VALID_KEYS {
            let value = match *key {
                "general.verbose" | "images.durable" => "true",
                "general.log_format" => "json",
                "catalog.batch_size" => "10",
                k if k.ends_with("_dir") || k.ends_with("url") || k.ends_with("key") || k.ends_with("locale") => "x",
                _ => "5",
            };
            let mut config = Config::default();
            apply_setting(&mut config, key, value).unwrap_or_else(|e| panic!("{}: {}", key, e));
        }
    }

    #[test]
    fn set_values_land_in_config() {
        let mut config = Config::default();
        apply_setting(&mut config, "catalog.locale", "AU").unwrap();
        apply_setting(&mut config, "images.expiry_days", "3").unwrap();
        apply_setting(&mut config, "inventory.low_stock_grams", "75.5").unwrap();

        assert_eq!(config.catalog.locale, "AU");
        assert_eq!(config.images.expiry_days, 3);
        assert_eq!(config.inventory.low_stock_grams, 75.5);
    }

    #[test]
    fn empty_value_clears_optional() {
        let mut config = Config::default();
        apply_setting(&mut config, "catalog.api_key", "secret").unwrap();
        assert_eq!(config.catalog.api_key.as_deref(), Some("secret"));

        apply_setting(&mut config, "catalog.api_key", "").unwrap();
        assert!(config.catalog.api_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "catalog.batch_size", "21").is_err());
        assert!(apply_setting(&mut config, "catalog.batch_size", "0").is_err());
        assert!(apply_setting(&mut config, "general.log_format", "xml").is_err());
        assert!(apply_setting(&mut config, "images.durable", "maybe").is_err());
        assert!(apply_setting(&mut config, "catalog.page_size", "lots").is_err());
        assert!(apply_setting(&mut config, "vm.name", "x").is_err());
    }

    #[tokio::test]
    async fn init_respects_existing_file() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));
        let ctx = UiContext::non_interactive();

        init_config(&manager, false, &ctx).await.unwrap();
        std::fs::write(manager.path(), "[catalog]\nlocale = \"AU\"\n").unwrap();

        init_config(&manager, false, &ctx).await.unwrap();
        assert_eq!(manager.load().await.unwrap().catalog.locale, "AU");

        init_config(&manager, true, &ctx).await.unwrap();
        assert_eq!(manager.load().await.unwrap().catalog.locale, "US");
    }
}
