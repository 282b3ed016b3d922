//! Entity creation

pub mod player;
pub mod enemies;

pub use player::spawn_player;
pub use enemies::{enemies_for_floor, spawn_enemies_for_floor, spawn_enemy, spawn_positions, EnemyDef};
