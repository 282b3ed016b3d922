//! Game state machine
//!
//! The game session: owns the current floor, the turn scheduler and the
//! run's progress, and broadcasts changes to whoever subscribed.

use std::time::Duration;

use hecs::Entity;

use super::level::{Level, LevelEvent, TurnInput};
use super::turn::{SchedulerState, TurnScheduler};
use crate::combat::Combatant;
use crate::config::GameConfig;
use crate::ecs::Health;
use crate::events::{ListenerId, Observers};

/// Upper bound on scheduler ticks per frame. Instant turns (off-screen
/// enemies) chain within one frame; anything animated stops the chain.
const MAX_TICKS_PER_FRAME: usize = 64;

/// Messages kept in the log
const MESSAGE_LIMIT: usize = 100;

/// All possible game states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Main menu screen
    MainMenu,
    /// Actively playing
    Playing,
    /// Game is paused
    Paused,
    /// Player died
    GameOver { floor_reached: u32 },
    /// Exit the game
    Quit,
}

/// Change notifications, each carrying the new value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    StateChanged(GameState),
    HealthChanged { entity: Entity, current: i32, max: i32 },
    GoldChanged(u32),
    FloorChanged(u32),
}

/// A message in the game log
#[derive(Debug, Clone, PartialEq)]
pub struct GameMessage {
    pub text: String,
    pub category: MessageCategory,
}

/// Categories for message filtering/coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Combat,
    System,
    Warning,
}

/// The main game struct that holds all game data
pub struct Game {
    state: GameState,
    config: GameConfig,
    /// Seed of the current run; every floor derives from it
    run_seed: u64,
    floor: u32,
    gold: u32,
    kills: u32,
    level: Option<Level>,
    scheduler: TurnScheduler<Combatant, Level>,
    observers: Observers<GameEvent>,
    messages: Vec<GameMessage>,
    descent_requested: bool,
}

impl Game {
    /// Create a new game instance sitting at the main menu
    pub fn new(config: GameConfig) -> Self {
        Self {
            state: GameState::MainMenu,
            run_seed: config.seed.unwrap_or(0),
            config,
            floor: 0,
            gold: 0,
            kills: 0,
            level: None,
            scheduler: TurnScheduler::new(),
            observers: Observers::new(),
            messages: Vec::new(),
            descent_requested: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Get the current game state
    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Get the current floor number
    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.level.as_mut()
    }

    pub fn scheduler(&self) -> &TurnScheduler<Combatant, Level> {
        &self.scheduler
    }

    pub fn player_health(&self) -> Option<Health> {
        self.level.as_ref().and_then(|l| l.player_health())
    }

    /// Is the scheduler waiting on the player right now?
    pub fn is_players_turn(&self) -> bool {
        self.level
            .as_ref()
            .map_or(false, |l| self.scheduler.is_actors_turn(Combatant::Player(l.player())))
    }

    /// Get all messages
    pub fn messages(&self) -> &[GameMessage] {
        &self.messages
    }

    /// Add a message to the log
    pub fn add_message(&mut self, text: impl Into<String>, category: MessageCategory) {
        self.messages.push(GameMessage {
            text: text.into(),
            category,
        });
        if self.messages.len() > MESSAGE_LIMIT {
            let excess = self.messages.len() - MESSAGE_LIMIT;
            self.messages.drain(..excess);
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, handler: impl FnMut(&GameEvent) + 'static) -> ListenerId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Set a new game state. Setting the current state again is a no-op.
    pub fn set_state(&mut self, state: GameState) {
        if self.state == state {
            return;
        }
        log::info!("State transition: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.observers.notify(&GameEvent::StateChanged(state));
    }

    pub fn pause(&mut self) {
        if self.state == GameState::Playing {
            self.scheduler.pause();
            self.set_state(GameState::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.scheduler.resume();
            self.set_state(GameState::Playing);
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => self.pause(),
            GameState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Abandon the run and go back to the menu
    pub fn return_to_menu(&mut self) {
        self.scheduler.reset();
        self.level = None;
        self.set_state(GameState::MainMenu);
    }

    pub fn quit(&mut self) {
        self.set_state(GameState::Quit);
    }

    // ------------------------------------------------------------------
    // Run progress
    // ------------------------------------------------------------------

    /// Start a run on floor 1 with full health and no gold
    pub fn start_new_run(&mut self) {
        self.run_seed = self.config.seed.unwrap_or_else(rand::random);
        log::info!("Starting new run with seed {}", self.run_seed);

        self.messages.clear();
        self.kills = 0;
        self.gold = 0;
        self.observers.notify(&GameEvent::GoldChanged(0));
        self.floor = 0;

        self.enter_floor(1, None);
        self.scheduler.resume();
        self.add_message("You descend into the dark. Find the way down (>).", MessageCategory::System);
        self.set_state(GameState::Playing);
    }

    /// Go down one floor: fresh level, player on its entry, wounds kept
    pub fn descend(&mut self) {
        let carried = self.player_health();
        let next = self.floor + 1;
        self.enter_floor(next, carried);
        self.add_message(format!("You reach floor {}.", next), MessageCategory::System);
    }

    fn enter_floor(&mut self, floor: u32, carried_health: Option<Health>) {
        self.descent_requested = false;
        self.floor = floor;
        let level = Level::new(floor, self.run_seed, &self.config, carried_health);
        self.scheduler.start_combat(level.combatants(), &level);
        self.level = Some(level);
        self.observers.notify(&GameEvent::FloorChanged(floor));
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
        self.observers.notify(&GameEvent::GoldChanged(self.gold));
    }

    /// Spend gold if there is enough. Returns whether it was spent.
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.gold < amount {
            return false;
        }
        self.gold -= amount;
        self.observers.notify(&GameEvent::GoldChanged(self.gold));
        true
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Queue input for the player's turn. Ignored outside play.
    pub fn submit_input(&mut self, input: TurnInput) {
        if self.state != GameState::Playing {
            return;
        }
        if let Some(level) = self.level.as_mut() {
            level.set_input(input);
        }
    }

    /// Update game state (called every frame)
    pub fn update(&mut self, delta: Duration) {
        if self.state != GameState::Playing {
            return;
        }

        for tick in 0..MAX_TICKS_PER_FRAME {
            let Some(level) = self.level.as_mut() else {
                return;
            };
            // Only the first tick of a frame moves animations forward
            level.set_frame_delta(if tick == 0 { delta } else { Duration::ZERO });

            let before = self.scheduler.turns_completed();
            self.scheduler.tick(level);
            let progressed = self.scheduler.turns_completed() != before;
            let events = level.drain_events();

            self.handle_level_events(events);
            if !progressed || self.state != GameState::Playing || self.descent_requested {
                break;
            }
        }

        // Input is per frame; an unused intent does not carry over
        if let Some(level) = self.level.as_mut() {
            level.clear_input();
        }

        if self.descent_requested && self.state == GameState::Playing {
            self.descend();
        }

        if self.scheduler.state() == SchedulerState::Ended && self.state == GameState::Playing {
            log::warn!("Turn queue ran dry on floor {}", self.floor);
            self.set_state(GameState::GameOver { floor_reached: self.floor });
        }
    }

    fn handle_level_events(&mut self, events: Vec<LevelEvent>) {
        for event in events {
            match event {
                LevelEvent::HealthChanged { entity, current, max } => {
                    self.observers
                        .notify(&GameEvent::HealthChanged { entity, current, max });
                }
                LevelEvent::Died { entity, was_player, gold } => {
                    if was_player {
                        self.scheduler.remove_actor(Combatant::Player(entity));
                        self.add_message("You die.", MessageCategory::Warning);
                        self.set_state(GameState::GameOver { floor_reached: self.floor });
                    } else {
                        self.scheduler.remove_actor(Combatant::Enemy(entity));
                        self.kills += 1;
                        if gold > 0 {
                            self.add_gold(gold);
                            self.add_message(format!("You find {} gold.", gold), MessageCategory::System);
                        }
                    }
                }
                LevelEvent::ExitReached => {
                    self.descent_requested = true;
                }
                LevelEvent::Message(text) => self.add_message(text, MessageCategory::Combat),
            }
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("floor", &self.floor)
            .field("gold", &self.gold)
            .field("level", &self.level)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded_game() -> Game {
        let config = GameConfig {
            seed: Some(2024),
            ..GameConfig::default()
        };
        Game::new(config)
    }

    fn record(game: &mut Game) -> Rc<RefCell<Vec<GameEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&events);
        game.subscribe(move |e| log.borrow_mut().push(*e));
        events
    }

    #[test]
    fn test_new_run_starts_on_floor_one() {
        let mut game = seeded_game();
        let events = record(&mut game);
        assert_eq!(game.state(), GameState::MainMenu);

        game.start_new_run();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.floor(), 1);
        assert_eq!(game.gold(), 0);
        assert_eq!(game.run_seed(), 2024);
        assert!(events.borrow().contains(&GameEvent::FloorChanged(1)));
        assert!(events.borrow().contains(&GameEvent::StateChanged(GameState::Playing)));
    }

    #[test]
    fn test_player_acts_first() {
        let mut game = seeded_game();
        game.start_new_run();
        game.update(Duration::from_millis(16));
        assert!(game.is_players_turn());

        // No input: the player's turn stays open indefinitely
        for _ in 0..100 {
            game.update(Duration::from_millis(16));
        }
        assert!(game.is_players_turn());
        assert_eq!(game.scheduler().turns_completed(), 0);
    }

    #[test]
    fn test_waiting_lets_enemies_act() {
        let mut game = seeded_game();
        game.start_new_run();
        game.update(Duration::from_millis(16));

        game.submit_input(TurnInput::Wait);
        for _ in 0..600 {
            game.update(Duration::from_millis(16));
            if game.is_players_turn() {
                break;
            }
        }
        assert!(game.is_players_turn());
        assert!(game.scheduler().turns_completed() >= 1);
    }

    #[test]
    fn test_pause_blocks_updates() {
        let mut game = seeded_game();
        game.start_new_run();
        game.pause();
        assert_eq!(game.state(), GameState::Paused);
        assert!(game.scheduler().is_paused());

        game.submit_input(TurnInput::Wait);
        game.update(Duration::from_millis(16));
        assert_eq!(game.scheduler().turns_completed(), 0);

        game.toggle_pause();
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_gold() {
        let mut game = seeded_game();
        let events = record(&mut game);
        game.add_gold(30);
        assert!(!game.spend_gold(31));
        assert!(game.spend_gold(12));
        assert_eq!(game.gold(), 18);
        assert_eq!(
            *events.borrow(),
            vec![GameEvent::GoldChanged(30), GameEvent::GoldChanged(18)]
        );
    }

    #[test]
    fn test_descend_keeps_wounds_and_bumps_floor() {
        let mut game = seeded_game();
        game.start_new_run();
        let player = game.level().unwrap().player();
        let before_seed = game.level().unwrap().seed();
        game.level_mut()
            .unwrap()
            .world_mut()
            .get::<&mut Health>(player)
            .unwrap()
            .current = 42;

        game.descend();
        assert_eq!(game.floor(), 2);
        assert_eq!(game.player_health().unwrap().current, 42);
        assert_ne!(game.level().unwrap().seed(), before_seed);
        let level = game.level().unwrap();
        assert_eq!(level.player_position(), level.grid().entry_position());
    }

    #[test]
    fn test_player_death_ends_run() {
        let mut game = seeded_game();
        game.start_new_run();
        let level = game.level_mut().unwrap();
        let player = level.player();
        level.damage(player, player, 10_000);

        game.update(Duration::from_millis(16));
        assert_eq!(game.state(), GameState::GameOver { floor_reached: 1 });
        assert!(!game.is_players_turn());
    }

    /// A floor with nobody on it but the player
    fn empty_floor_game() -> Game {
        let mut config = GameConfig {
            seed: Some(2024),
            ..GameConfig::default()
        };
        config.rules.min_enemies = 0;
        config.rules.enemies_per_floor = 0;
        Game::new(config)
    }

    #[test]
    fn test_enemy_hits_are_broadcast_and_kills_leave_the_queue() {
        let mut game = empty_floor_game();
        game.start_new_run();
        game.update(Duration::from_millis(16));
        assert!(game.is_players_turn());

        // Put an enemy right next to the player and schedule it
        let level = game.level.as_mut().unwrap();
        let player = level.player();
        let pos = level.player_position().unwrap();
        let spot = pos
            .cardinal_neighbors()
            .into_iter()
            .find(|n| level.grid().is_walkable_at(*n))
            .unwrap();
        let enemy = crate::entities::spawn_enemy(
            level.world_mut(),
            &crate::entities::enemies::ASH_SKELETON,
            spot,
            &GameConfig::default().enemies,
            5,
        );
        let foe = Combatant::Enemy(enemy);
        assert!(game.scheduler.add_actor(foe, game.level.as_ref().unwrap()));

        let events = record(&mut game);
        game.submit_input(TurnInput::Wait);
        game.update(Duration::from_millis(16));

        let hp = game.player_health().unwrap();
        assert!(hp.current < hp.max);
        assert!(events.borrow().contains(&GameEvent::HealthChanged {
            entity: player,
            current: hp.current,
            max: hp.max,
        }));

        // Let the swing finish so the enemy is back in line
        for _ in 0..120 {
            if game.is_players_turn() {
                break;
            }
            game.update(Duration::from_millis(16));
        }
        assert!(game.is_players_turn());
        assert!(game.scheduler().queue().any(|a| a == foe));

        events.borrow_mut().clear();
        game.level_mut().unwrap().damage(player, enemy, 10_000);
        game.update(Duration::from_millis(16));

        assert!(!game.scheduler().queue().any(|a| a == foe));
        assert!(!game.scheduler().is_actors_turn(foe));
        assert_eq!(game.scheduler().len(), 1);
        assert_eq!(game.kills(), 1);
        assert_eq!(game.gold(), 5);
        assert!(events.borrow().contains(&GameEvent::GoldChanged(5)));
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn test_set_same_state_is_silent() {
        let mut game = seeded_game();
        let events = record(&mut game);
        game.set_state(GameState::MainMenu);
        assert!(events.borrow().is_empty());
        game.quit();
        assert_eq!(*events.borrow(), vec![GameEvent::StateChanged(GameState::Quit)]);
    }
}
