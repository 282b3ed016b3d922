//! Rendering helpers
//!
//! Glyph selection and fog-of-war shading for the terminal map.

pub mod mode;
pub mod palette;
pub mod tilemap;

pub use mode::{detect_render_mode, RenderMode};
pub use palette::{Palette, Rgb};
pub use tilemap::{entity_char, TileRenderer};
