//! Interactive prompts with non-interactive fallback

use super::context::UiContext;
use crate::error::{SpoolError, SpoolResult};

/// Ask a yes/no question
///
/// `--yes` answers yes; a non-interactive session takes `default`.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> SpoolResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| SpoolError::Task(format!("prompt: {}", e)))?;

    answer.map_err(|e| SpoolError::User(format!("Prompt failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_yes_overrides_default() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Reset all stock?", false).await.unwrap());
    }

    #[tokio::test]
    async fn non_interactive_takes_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Add anyway?", true).await.unwrap());
        assert!(!confirm(&ctx, "Add anyway?", false).await.unwrap());
    }
}
