//! Spoolkeeper - filament inventory for 3D print production
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use spoolkeeper::cli::{Cli, Commands};
use spoolkeeper::config::{Config, ConfigManager};
use spoolkeeper::error::SpoolResult;
use spoolkeeper::ui::{self, UiContext};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            } else if e.is_retryable() {
                eprintln!("{} temporary failure, try again", style("Hint:").yellow());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SpoolResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config at {}", config_manager.path().display());

    let ctx = UiContext::detect().with_plain(cli.plain);
    if ctx.use_fancy_output() {
        ui::init_theme();
    }

    let command = match cli.command {
        Commands::Config(args) => {
            return spoolkeeper::cli::commands::config(args, &config, &config_manager, &ctx).await
        }
        other => other,
    };

    if let Some(key) = cli.api_key {
        config.catalog.api_key = Some(key);
    }
    ConfigManager::ensure_state_dirs(&config).await?;

    match command {
        Commands::Config(_) => Ok(()),
        Commands::Designs(args) => spoolkeeper::cli::commands::designs(args, &config, &ctx).await,
        Commands::Stock(args) => spoolkeeper::cli::commands::stock(args, &config, &ctx).await,
        Commands::Queue(args) => spoolkeeper::cli::commands::queue(args, &config, &ctx).await,
        Commands::Image(args) => spoolkeeper::cli::commands::image(args, &config, &ctx).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` implies at least info
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose.max(u8::from(config.general.verbose)) {
        0 => "spoolkeeper=warn",
        1 => "spoolkeeper=info",
        _ => "spoolkeeper=debug",
    };
    let filter = EnvFilter::new(level);

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}
