//! Terminal UI helpers
//!
//! Uses `cliclack` for prompts and status lines and `indicatif` for batch
//! progress, with plain output when stdout is not an interactive terminal.
//!
//! ```rust,ignore
//! use spoolkeeper::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Fetching snorlax-bookend...");
//! spinner.stop("Snorlax Bookend");
//!
//! if ui::confirm(&ctx, "Add to queue anyway?", false).await? {
//!     ui::step_ok(&ctx, "Queued Snorlax Bookend (x1)");
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{remark, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint};
pub use progress::{BatchProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, SpoolTheme};
