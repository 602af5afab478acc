//! Queue command - list, add, remove or check designs in the production queue

use super::{grams, open_ledger};
use crate::catalog::{find_design, CatalogApi, HttpCatalog};
use crate::cli::args::{OutputFormat, QueueAction, QueueArgs};
use crate::config::Config;
use crate::error::SpoolResult;
use crate::inventory::{Design, Evaluation, Ledger, QueueEntry, Requirement};
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;

/// Execute the queue command
pub async fn execute(args: QueueArgs, config: &Config, ctx: &UiContext) -> SpoolResult<()> {
    let mut ledger = open_ledger(config)?;

    match args.action {
        None => list(&ledger, args.format)?,
        Some(QueueAction::Add { slug, force, yes }) => {
            let ctx = ctx.clone().with_auto_yes(yes || ctx.auto_yes());
            let catalog = HttpCatalog::from_config(&config.catalog)?;
            let design = fetch_design(&catalog, &slug, &config.catalog.locale, &ctx).await?;
            add(&mut ledger, &design, force, &ctx).await?;
        }
        Some(QueueAction::Remove { index }) => remove(&mut ledger, index, ctx)?,
        Some(QueueAction::Check { slug }) => {
            let catalog = HttpCatalog::from_config(&config.catalog)?;
            let design = fetch_design(&catalog, &slug, &config.catalog.locale, ctx).await?;
            print_requirements(&design, &ledger.evaluate(&design));
        }
    }

    Ok(())
}

async fn fetch_design(
    api: &dyn CatalogApi,
    slug: &str,
    locale: &str,
    ctx: &UiContext,
) -> SpoolResult<Design> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Fetching {}...", slug));

    match find_design(api, slug, locale).await {
        Ok(design) => {
            spinner.stop(&design.title);
            Ok(design)
        }
        Err(e) => {
            spinner.stop_error(&format!("Could not fetch {}", slug));
            Err(e)
        }
    }
}

/// Queue one print of `design`, asking first when stock is short
async fn add(ledger: &mut Ledger, design: &Design, force: bool, ctx: &UiContext) -> SpoolResult<()> {
    let evaluation = ledger.evaluate(design);

    if evaluation.has_shortage {
        print_shortages(design, &evaluation);
        if !force && !ui::confirm(ctx, "Add to queue anyway?", false).await? {
            ui::step_warn_hint(ctx, "Not queued", "Use --force to queue despite the shortage");
            return Ok(());
        }
    }

    ledger.commit(design)?;

    let quantity = ledger
        .queue()
        .iter()
        .find(|e| e.design.slug == design.slug)
        .map(|e| e.quantity)
        .unwrap_or(1);
    ui::step_ok(ctx, &format!("Queued {} (x{})", design.title, quantity));
    Ok(())
}

fn remove(ledger: &mut Ledger, position: usize, ctx: &UiContext) -> SpoolResult<()> {
    let Some(index) = position.checked_sub(1) else {
        ui::remark(ctx, "Queue positions start at 1");
        return Ok(());
    };

    let title = ledger.queue().get(index).map(|e| e.design.title.clone());
    if ledger.reverse(index)? {
        ui::step_ok(ctx, &format!("Removed one {} and returned its filament", title.unwrap_or_default()));
    } else {
        ui::remark(ctx, &format!("Nothing queued at position {}", position));
    }
    Ok(())
}

fn list(ledger: &Ledger, format: OutputFormat) -> SpoolResult<()> {
    let queue = ledger.queue();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(queue)?);
        return Ok(());
    }

    if queue.is_empty() {
        println!("Print queue is empty");
        return Ok(());
    }

    for (position, entry) in queue.iter().enumerate() {
        println!("{}", queue_line(position + 1, entry));
    }

    let total: f64 = queue.iter().map(QueueEntry::total_weight).sum();
    println!();
    println!("{} designs, {} total", queue.len(), grams(total));
    Ok(())
}

/// One listing row: position, title, quantity and line weight
fn queue_line(position: usize, entry: &QueueEntry) -> String {
    format!(
        "{:>3}. {:<32} x{:<3} {:>9} total",
        position,
        entry.design.title,
        entry.quantity,
        grams(entry.total_weight())
    )
}

/// Shortage amount as shown in reports, e.g. `-150.0g`
fn shortage_text(requirement: &Requirement) -> String {
    format!("-{}", grams(requirement.shortage))
}

fn requirement_name(requirement: &Requirement) -> &str {
    requirement
        .color
        .as_deref()
        .or(requirement.filament_id.as_deref())
        .unwrap_or("(unnamed filament)")
}

fn print_shortages(design: &Design, evaluation: &Evaluation) {
    println!(
        "{} Missing filament for {}:",
        style("!").yellow(),
        style(&design.title).bold()
    );
    for requirement in evaluation.shortages() {
        println!(
            "    {:<24} {}",
            requirement_name(requirement),
            style(shortage_text(requirement)).red()
        );
        if let Some(url) = &requirement.product_url {
            println!("    {:<24} Buy: {}", "", style(url).dim());
        }
    }
}

fn print_requirements(design: &Design, evaluation: &Evaluation) {
    println!("{}", style(&design.title).bold());
    if evaluation.requirements.is_empty() {
        println!("  No filament requirements listed");
        return;
    }

    for requirement in &evaluation.requirements {
        let status = if requirement.shortage > 0.0 {
            style(shortage_text(requirement)).red()
        } else {
            style("ok".to_string()).green()
        };
        println!(
            "  {:<24} need {:>8}  have {:>9}  {}",
            requirement_name(requirement),
            grams(requirement.needed),
            grams(requirement.available),
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{DefaultCatalog, DesignFilament, MemoryRegion, Retention};

    fn ledger() -> Ledger {
        Ledger::load(
            &DefaultCatalog::bundled().unwrap(),
            Box::new(MemoryRegion::new("inventory", Retention::LongLived)),
            Box::new(MemoryRegion::new("queue", Retention::Session)),
        )
        .unwrap()
    }

    fn heavy_design() -> Design {
        Design::new("snorlax-bookend", "Snorlax Bookend").with_filament(DesignFilament {
            filament_id: Some("pla-basic-black".to_string()),
            color: Some("Black".to_string()),
            weight_grams: Some(1250.0),
            product_url: Some("https://shop.example.com/pla-basic-black".to_string()),
            ..DesignFilament::default()
        })
    }

    #[test]
    fn shortage_is_negative_grams() {
        let evaluation = ledger().evaluate(&heavy_design());
        let shortage = evaluation.shortages().next().unwrap();

        assert_eq!(shortage_text(shortage), "-250.0g");
        assert_eq!(requirement_name(shortage), "Black");
    }

    #[test]
    fn queue_line_shows_quantity_total() {
        let mut design = Design::new("pikachu-planter", "Pikachu Planter");
        design.total_weight_grams = Some(42.5);
        let entry = QueueEntry {
            design,
            quantity: 2,
            added_at: chrono::Utc::now(),
            debits: Vec::new(),
        };

        let line = queue_line(1, &entry);
        assert!(line.contains("Pikachu Planter"));
        assert!(line.contains("x2"));
        assert!(line.ends_with("85.0g total"));
    }

    #[tokio::test]
    async fn shortage_without_force_is_not_queued() {
        let mut ledger = ledger();
        let ctx = UiContext::non_interactive();

        add(&mut ledger, &heavy_design(), false, &ctx).await.unwrap();

        assert!(ledger.queue().is_empty());
        assert_eq!(ledger.filament("pla-basic-black").unwrap().stock_grams, 1000.0);
    }

    #[tokio::test]
    async fn forced_shortage_clamps_stock() {
        let mut ledger = ledger();
        let ctx = UiContext::non_interactive();

        add(&mut ledger, &heavy_design(), true, &ctx).await.unwrap();

        assert_eq!(ledger.queue().len(), 1);
        assert_eq!(ledger.filament("pla-basic-black").unwrap().stock_grams, 0.0);
    }

    #[tokio::test]
    async fn auto_yes_confirms_shortage() {
        let mut ledger = ledger();
        let ctx = UiContext::non_interactive().with_auto_yes(true);

        add(&mut ledger, &heavy_design(), false, &ctx).await.unwrap();
        assert_eq!(ledger.queue().len(), 1);
    }

    #[tokio::test]
    async fn remove_uses_one_based_positions() {
        let mut ledger = ledger();
        let ctx = UiContext::non_interactive();
        add(&mut ledger, &heavy_design(), true, &ctx).await.unwrap();

        remove(&mut ledger, 0, &ctx).unwrap();
        remove(&mut ledger, 2, &ctx).unwrap();
        assert_eq!(ledger.queue().len(), 1);

        remove(&mut ledger, 1, &ctx).unwrap();
        assert!(ledger.queue().is_empty());
        assert_eq!(ledger.filament("pla-basic-black").unwrap().stock_grams, 1000.0);
    }
}
