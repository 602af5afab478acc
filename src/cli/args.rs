//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Spoolkeeper - filament inventory for 3D print production
///
/// Browse the design catalog, check designs against your filament stock,
/// and keep a production queue that debits stock as designs are queued.
#[derive(Parser, Debug)]
#[command(name = "spoolkeeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SPOOLKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Designs API key (overrides catalog.api_key)
    #[arg(long, global = true, env = "SPOOLKEEPER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Plain output without spinners or prompt boxes
    #[arg(long, global = true)]
    pub plain: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the design catalog
    Designs(DesignsArgs),

    /// Show or edit filament stock
    Stock(StockArgs),

    /// Show or edit the production queue
    Queue(QueueArgs),

    /// Resolve an image through the cache
    Image(ImageArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the designs command
#[derive(Parser, Debug)]
pub struct DesignsArgs {
    /// Filter by title or pokemon name (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Filter by category ("all" for every category)
    #[arg(long)]
    pub category: Option<String>,

    /// Page to show (1-based)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Designs per page (default: from config)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Resolve thumbnails for the page through the image cache
    #[arg(long)]
    pub thumbnails: bool,

    /// List the catalog's categories instead of designs
    #[arg(long, conflicts_with_all = ["search", "category", "thumbnails"])]
    pub categories: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the stock command
#[derive(Parser, Debug)]
pub struct StockArgs {
    #[command(subcommand)]
    pub action: Option<StockAction>,

    /// Only show one series
    #[arg(long, default_value = "all")]
    pub series: SeriesFilter,
}

/// Stock subcommands
#[derive(Subcommand, Debug)]
pub enum StockAction {
    /// Set the grams on hand for a filament
    Set {
        /// Filament ID (e.g., pla-matte-charcoal)
        filament_id: String,
        /// Grams on hand; negative values are stored as 0
        #[arg(allow_negative_numbers = true, value_parser = parse_grams)]
        grams: f64,
    },

    /// Restore bundled stock levels and clear the queue
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Series selector for stock listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeriesFilter {
    All,
    Matte,
    Basic,
}

/// Arguments for the queue command
#[derive(Parser, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub action: Option<QueueAction>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Queue subcommands
#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// Queue a design, debiting its filament from stock
    Add {
        /// Design slug
        slug: String,

        /// Queue even when stock is short
        #[arg(short, long)]
        force: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove one unit of a queued design, crediting stock back
    Remove {
        /// Queue position as listed (1-based)
        index: usize,
    },

    /// Show filament requirements for a design without queueing it
    Check {
        /// Design slug
        slug: String,
    },
}

/// Arguments for the image command
#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// Image URL
    pub url: String,

    /// Label used in diagnostics (e.g., the design title)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Write the image bytes to a file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., catalog.locale)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Parse a gram amount, rejecting `inf` and `NaN`
fn parse_grams(value: &str) -> Result<f64, String> {
    let grams: f64 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if grams.is_finite() {
        Ok(grams)
    } else {
        Err(format!("`{}` is not a finite amount of grams", value))
    }
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}
