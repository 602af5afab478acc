//! Designs command - browse the remote design catalog

use super::{grams, open_image_cache};
use crate::catalog::{
    categories, load_designs, paginate, total_pages, CatalogApi, DesignFilter, HttpCatalog,
};
use crate::cli::args::{DesignsArgs, OutputFormat};
use crate::config::Config;
use crate::error::SpoolResult;
use crate::images::{ImageSource, ImageState};
use crate::inventory::{DefaultCatalog, Design, DesignFilament};
use crate::ui::{self, BatchProgress, UiContext};
use console::style;
use futures_util::future::join_all;
use tracing::debug;

/// Execute the designs command
pub async fn execute(args: DesignsArgs, config: &Config, ctx: &UiContext) -> SpoolResult<()> {
    let catalog = HttpCatalog::from_config(&config.catalog)?;
    let designs = fetch_all(&catalog, config, ctx).await?;

    if args.categories {
        return list_categories(&designs, args.format, ctx);
    }

    let filter = DesignFilter::new(args.search.as_deref(), args.category.as_deref());
    let matching: Vec<Design> = filter.apply(&designs).into_iter().cloned().collect();

    let page_size = args.page_size.unwrap_or(config.catalog.page_size).max(1);
    let pages = total_pages(matching.len(), page_size);
    let page = paginate(&matching, args.page, page_size);
    debug!(
        "{} of {} designs match, page {}/{}",
        matching.len(),
        designs.len(),
        args.page,
        pages
    );

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }

    if matching.is_empty() {
        ui::step_info(ctx, "No designs found");
        return Ok(());
    }

    let thumbnails = if args.thumbnails {
        Some(resolve_thumbnails(page, config).await)
    } else {
        None
    };

    let swatches = DefaultCatalog::bundled()?;
    println!(
        "{}  {}",
        style("Design Library").bold(),
        style(format!("Page {} of {}", args.page, pages)).dim()
    );
    for (i, design) in page.iter().enumerate() {
        let thumb = thumbnails.as_ref().map(|states| thumbnail_status(&states[i]));
        print_design(design, &swatches, thumb.as_deref());
    }

    if args.page > pages {
        ui::remark(ctx, &format!("Only {} pages available", pages));
    }

    Ok(())
}

async fn fetch_all(api: &dyn CatalogApi, config: &Config, ctx: &UiContext) -> SpoolResult<Vec<Design>> {
    let progress = BatchProgress::new(ctx, "Loading designs");
    let result = load_designs(
        api,
        config.catalog.total_designs,
        config.catalog.batch_size,
        &config.catalog.locale,
        |done, total| progress.on_batch(done, total),
    )
    .await;
    progress.finish();
    result
}

fn list_categories(designs: &[Design], format: OutputFormat, ctx: &UiContext) -> SpoolResult<()> {
    let counts = category_counts(designs);

    if format == OutputFormat::Json {
        let listing: Vec<_> = counts
            .iter()
            .map(|(name, count)| serde_json::json!({ "category": name, "designs": count }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if counts.is_empty() {
        ui::step_info(ctx, "No categories in the catalog");
        return Ok(());
    }
    for (name, count) in counts {
        println!("  {:<24} {}", name, style(format!("{} designs", count)).dim());
    }
    Ok(())
}

/// Categories in first-seen order with their design counts
fn category_counts(designs: &[Design]) -> Vec<(&str, usize)> {
    categories(designs)
        .into_iter()
        .map(|name| {
            let count = designs.iter().filter(|d| d.category() == Some(name)).count();
            (name, count)
        })
        .collect()
}

/// Resolve every thumbnail on the page concurrently
async fn resolve_thumbnails(page: &[Design], config: &Config) -> Vec<ImageState> {
    let cache = open_image_cache(config).await;

    let subscriptions: Vec<_> = page
        .iter()
        .map(|d| cache.subscribe(d.image_url.as_deref(), Some(&d.title)))
        .collect();
    let states = join_all(subscriptions.iter().map(|s| s.resolved())).await;

    cache.diagnostics().flush_now();
    states
        .into_iter()
        .map(|state| state.unwrap_or_else(ImageState::pending))
        .collect()
}

fn thumbnail_status(state: &ImageState) -> String {
    match (&state.source, state.from_cache) {
        (Some(ImageSource::Bytes(bytes)), true) => format!("image cached ({} bytes)", bytes.len()),
        (Some(ImageSource::Bytes(bytes)), false) => format!("image fetched ({} bytes)", bytes.len()),
        (Some(ImageSource::Url(url)), _) => format!("image unavailable, use {}", url),
        (None, _) => "no image".to_string(),
    }
}

/// Swatch for a design filament, falling back to the bundled catalog
fn swatch<'a>(filament: &'a DesignFilament, catalog: &'a DefaultCatalog) -> &'a str {
    filament.hex.as_deref().unwrap_or_else(|| {
        filament
            .filament_id
            .as_deref()
            .map(|id| catalog.hex_for(id))
            .unwrap_or(crate::inventory::FALLBACK_HEX)
    })
}

fn print_design(design: &Design, catalog: &DefaultCatalog, thumbnail: Option<&str>) {
    println!();
    println!(
        "  {}  {}",
        style(&design.title).bold(),
        style(&design.slug).dim()
    );

    let mut details = Vec::new();
    if let Some(category) = design.category() {
        details.push(category.to_string());
    }
    if let Some(pokemon) = design.pokemon_name() {
        details.push(pokemon.to_string());
    }
    details.push(grams(design.total_weight()));
    println!("    {}", details.join(" · "));

    let colors: Vec<String> = design
        .filaments
        .iter()
        .map(|f| {
            let name = f
                .color
                .as_deref()
                .or(f.filament_id.as_deref())
                .unwrap_or("?");
            format!("{} {}", name, style(swatch(f, catalog)).dim())
        })
        .collect();
    if !colors.is_empty() {
        println!("    {}", colors.join(", "));
    }

    if let Some(thumbnail) = thumbnail {
        println!("    {}", style(thumbnail).dim());
    }
}
