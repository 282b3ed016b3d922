//! Emberdeep - a torch-lit terminal dungeon crawler
//!
//! Procedurally generated floors explored under a fog of war, with the
//! player and every monster taking turns through one shared queue.

pub mod combat;
pub mod config;
pub mod ecs;
pub mod entities;
pub mod events;
pub mod game;
pub mod render;
pub mod ui;
pub mod world;

// Re-export commonly used types
pub use config::GameConfig;
pub use game::{Game, GameState};
pub use world::GridModel;
