//! Combat system

pub mod actors;
pub mod damage;

pub use actors::{step_from_intent, Combatant, EnemyTurn, PlayerTurn};
pub use damage::{apply_damage, roll_damage, DamageOutcome};
