//! Image command - resolve one image through the two-tier cache

use super::open_image_cache;
use crate::cli::args::ImageArgs;
use crate::config::Config;
use crate::error::{SpoolError, SpoolResult};
use crate::images::{ImageSource, ImageState};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Execute the image command
pub async fn execute(args: ImageArgs, config: &Config, ctx: &UiContext) -> SpoolResult<()> {
    let cache = open_image_cache(config).await;
    if !cache.is_durable() {
        ui::step_warn(ctx, "Image store unavailable, caching in memory only");
    }

    let subscription = cache.subscribe(Some(&args.url), args.label.as_deref());
    let state = subscription
        .resolved()
        .await
        .ok_or_else(|| SpoolError::Internal("image resolution was cancelled".to_string()))?;
    cache.diagnostics().flush_now();

    report(&state, args.out.as_deref(), ctx).await
}

async fn report(state: &ImageState, out: Option<&Path>, ctx: &UiContext) -> SpoolResult<()> {
    match &state.source {
        Some(ImageSource::Bytes(bytes)) => {
            let origin = if state.from_cache { "cache" } else { "network" };
            ui::step_ok_detail(ctx, &format!("{} bytes", bytes.len()), origin);

            if let Some(path) = out {
                fs::write(path, bytes.as_slice())
                    .await
                    .map_err(|e| SpoolError::io(format!("writing image to {}", path.display()), e))?;
                ui::step_ok(ctx, &format!("Wrote {}", path.display()));
            }
        }
        Some(ImageSource::Url(url)) => {
            let reason = state.error.as_deref().unwrap_or("unknown error");
            ui::step_warn_hint(ctx, &format!("Could not load image ({})", reason), url);
        }
        None => {
            ui::step_warn(ctx, state.error.as_deref().unwrap_or("No image"));
        }
    }
    Ok(())
}
