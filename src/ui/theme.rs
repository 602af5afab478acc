//! cliclack theme for spoolkeeper prompts

use cliclack::ThemeState;
use console::Style;

/// Prompt theme with magenta accents
#[derive(Debug, Clone, Default)]
pub struct SpoolTheme;

impl cliclack::Theme for SpoolTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().magenta().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme for every prompt in this process
pub fn init_theme() {
    cliclack::set_theme(SpoolTheme);
}
