//! Stock command - list, set or reset filament stock

use super::{grams, open_ledger};
use crate::cli::args::{SeriesFilter, StockAction, StockArgs};
use crate::config::Config;
use crate::error::{SpoolError, SpoolResult};
use crate::inventory::{Filament, Ledger, Series};
use crate::ui::{self, UiContext};
use console::style;

/// Execute the stock command
pub async fn execute(args: StockArgs, config: &Config, ctx: &UiContext) -> SpoolResult<()> {
    let mut ledger = open_ledger(config)?;

    match args.action {
        None => list(&ledger, args.series, config.inventory.low_stock_grams),
        Some(StockAction::Set { filament_id, grams: value }) => {
            if !ledger.set_stock(&filament_id, value)? {
                return Err(SpoolError::FilamentNotFound(filament_id));
            }
            let stored = ledger
                .filament(&filament_id)
                .map(|f| f.stock_grams)
                .unwrap_or_default();
            ui::step_ok(ctx, &format!("{} set to {}", filament_id, grams(stored)));
        }
        Some(StockAction::Reset { yes }) => reset(&mut ledger, ctx, yes).await?,
    }

    Ok(())
}

fn selected_series(filter: SeriesFilter) -> Vec<Series> {
    match filter {
        SeriesFilter::All => Series::all().to_vec(),
        SeriesFilter::Matte => vec![Series::Matte],
        SeriesFilter::Basic => vec![Series::Basic],
    }
}

/// Stock rows grouped by series, in catalog order
fn grouped(stock: &[Filament], series: &[Series]) -> Vec<(Series, Vec<Filament>)> {
    series
        .iter()
        .map(|s| {
            let rows = stock.iter().filter(|f| f.in_series(*s)).cloned().collect();
            (*s, rows)
        })
        .collect()
}

fn is_low(filament: &Filament, threshold: f64) -> bool {
    filament.stock_grams < threshold
}

fn list(ledger: &Ledger, filter: SeriesFilter, low_stock: f64) {
    for (series, rows) in grouped(ledger.stock(), &selected_series(filter)) {
        println!();
        println!("{}", style(series.label()).bold());
        println!(
            "{:<26} {:<16} {:<9} {:>10}",
            style("ID").dim(),
            style("COLOR").dim(),
            style("HEX").dim(),
            style("STOCK").dim()
        );

        for filament in &rows {
            let amount = grams(filament.stock_grams);
            let amount = if is_low(filament, low_stock) {
                style(format!("{} low", amount)).yellow()
            } else {
                style(amount)
            };
            println!(
                "{:<26} {:<16} {:<9} {:>10}",
                filament.filament_id, filament.color, filament.hex, amount
            );
        }
    }

    let total: f64 = ledger.stock().iter().map(|f| f.stock_grams).sum();
    println!();
    println!("{} filaments, {} on hand", ledger.stock().len(), grams(total));
}

async fn reset(ledger: &mut Ledger, ctx: &UiContext, yes: bool) -> SpoolResult<()> {
    let ctx = ctx.clone().with_auto_yes(yes || ctx.auto_yes());
    let queued = ledger.queue().len();

    let message = if queued > 0 {
        format!("Reset stock to defaults and clear {} queued designs?", queued)
    } else {
        "Reset stock to defaults?".to_string()
    };

    if !ui::confirm(&ctx, &message, false).await? {
        ui::step_info(&ctx, "Reset cancelled");
        return Ok(());
    }

    ledger.reset()?;
    ui::step_ok(&ctx, "Stock restored to defaults, queue cleared");
    Ok(())
}
