//! World module
//!
//! Grid data, procedural generation, and fog of war.

pub mod cell;
pub mod grid;
pub mod generation;
pub mod visibility;

pub use cell::Cell;
pub use grid::{GridModel, Room};
pub use generation::{generate, generate_usable, GeneratorConfig, RegenerationRules};
pub use visibility::{
    CellVisibility, ScanStrategy, VisibilitySettings, VisibilityTracker, VisibilityUpdated,
};
