//! Game module - Core game logic and state management

pub mod level;
mod state;
pub mod time;
pub mod turn;

pub use level::{Level, LevelEvent, TurnInput};
pub use state::{Game, GameEvent, GameMessage, GameState, MessageCategory};
pub use time::{Countdown, Tween};
pub use turn::{Actable, SchedulerState, TurnEvent, TurnScheduler, TurnStatus, TurnTask};
