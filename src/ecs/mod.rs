//! Entity Component System module
//!
//! Components attached to level entities and the systems that query them.

pub mod components;
pub mod systems;

pub use components::*;
pub use systems::{blocking_entity_at, enemy_at, enemy_count, is_valid_move, random_step, valid_moves};
