//! Render mode detection
//!
//! Picks Unicode glyphs when the terminal advertises UTF-8, ASCII otherwise.

use std::env;

/// Available rendering modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Classic ASCII characters (@ # . etc.)
    #[default]
    Ascii,
    /// Block and dot symbols
    Unicode,
}

impl RenderMode {
    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            RenderMode::Ascii => "ASCII",
            RenderMode::Unicode => "Unicode",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            RenderMode::Ascii => RenderMode::Unicode,
            RenderMode::Unicode => RenderMode::Ascii,
        }
    }
}

/// Detect the best rendering mode for the current terminal
pub fn detect_render_mode() -> RenderMode {
    let utf8 = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .any(|value| {
            let upper = value.to_uppercase();
            upper.contains("UTF-8") || upper.contains("UTF8")
        });

    if utf8 {
        log::info!("Using Unicode rendering mode");
        RenderMode::Unicode
    } else {
        log::info!("Falling back to ASCII rendering mode");
        RenderMode::Ascii
    }
}
