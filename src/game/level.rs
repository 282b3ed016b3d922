//! One dungeon floor
//!
//! Owns everything a turn needs to touch: the grid, the fog of war, the
//! entity world, the floor's random source and the pending input. Turns
//! report what happened through an outbox the game session drains.

use std::time::Duration;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::combat::{apply_damage, Combatant, DamageOutcome};
use crate::config::GameConfig;
use crate::ecs::{self, Attack, GoldReward, Health, Mobility, Name, Player, Position, VisualPosition};
use crate::entities::{spawn_enemies_for_floor, spawn_player};
use crate::world::generation::derive_seed;
use crate::world::{generate_usable, Cell, GridModel, VisibilityTracker};

/// Input handed to the player's turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnInput {
    /// Movement intent; any magnitude, it is normalised to one step
    Move { dx: f32, dy: f32 },
    /// Pass the turn
    Wait,
}

/// Something a turn did that the session has to react to
#[derive(Debug, Clone, PartialEq)]
pub enum LevelEvent {
    HealthChanged { entity: Entity, current: i32, max: i32 },
    Died { entity: Entity, was_player: bool, gold: u32 },
    ExitReached,
    Message(String),
}

pub struct Level {
    floor: u32,
    /// Seed the grid was generated from
    seed: u64,
    grid: GridModel,
    visibility: VisibilityTracker,
    world: World,
    rng: StdRng,
    player: Entity,
    /// Enemies in spawn order
    enemies: Vec<Entity>,
    input: Option<TurnInput>,
    frame_delta: Duration,
    events: Vec<LevelEvent>,
}

impl Level {
    /// Generate floor `floor` of the run and populate it.
    ///
    /// `carried_health` keeps the player's wounds from the previous floor.
    pub fn new(floor: u32, run_seed: u64, config: &GameConfig, carried_health: Option<Health>) -> Self {
        let (grid, seed) = generate_usable(
            &config.generator,
            derive_seed(run_seed, u64::from(floor)),
            &config.rules.regeneration,
        );
        let mut rng = StdRng::seed_from_u64(derive_seed(seed, 0));

        let start = grid
            .entry_position()
            .or_else(|| grid.walkable_positions().first().copied())
            .unwrap_or_else(|| {
                log::warn!("Floor {} has nowhere to stand", floor);
                Position::new(grid.width() / 2, grid.height() / 2)
            });

        let mut world = World::new();
        let player = spawn_player(&mut world, start, &config.player, carried_health);
        let enemies = spawn_enemies_for_floor(
            &mut world,
            &grid,
            floor,
            &config.enemies,
            &config.rules,
            &mut rng,
        );

        let mut visibility = VisibilityTracker::new(config.visibility, &grid);
        visibility.refresh(start.as_f32(), &grid);

        log::info!("Floor {} ready (seed {}), player at {:?}", floor, seed, start);

        Self {
            floor,
            seed,
            grid,
            visibility,
            world,
            rng,
            player,
            enemies,
            input: None,
            frame_delta: Duration::ZERO,
            events: Vec::new(),
        }
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut VisibilityTracker {
        &mut self.visibility
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    /// Living enemies, in spawn order
    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    /// Turn roster: the player first, then enemies in spawn order
    pub fn combatants(&self) -> Vec<Combatant> {
        std::iter::once(Combatant::Player(self.player))
            .chain(self.enemies.iter().map(|e| Combatant::Enemy(*e)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Entity helpers
    // ------------------------------------------------------------------

    pub fn position_of(&self, entity: Entity) -> Option<Position> {
        self.world.get::<&Position>(entity).ok().map(|p| *p)
    }

    pub fn visual_position_of(&self, entity: Entity) -> Option<VisualPosition> {
        self.world.get::<&VisualPosition>(entity).ok().map(|p| *p)
    }

    pub fn health_of(&self, entity: Entity) -> Option<Health> {
        self.world.get::<&Health>(entity).ok().map(|h| *h)
    }

    pub fn attack_of(&self, entity: Entity) -> Option<Attack> {
        self.world.get::<&Attack>(entity).ok().map(|a| *a)
    }

    pub fn name_of(&self, entity: Entity) -> String {
        self.world
            .get::<&Name>(entity)
            .map(|n| n.0.clone())
            .unwrap_or_else(|_| "something".to_string())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.health_of(entity).map_or(false, |h| !h.is_dead())
    }

    pub fn player_position(&self) -> Option<Position> {
        self.position_of(self.player)
    }

    pub fn player_health(&self) -> Option<Health> {
        self.health_of(self.player)
    }

    /// Seconds an entity needs to slide one cell
    pub fn step_time(&self, entity: Entity) -> f32 {
        self.world
            .get::<&Mobility>(entity)
            .map(|m| m.travel_time(1.0))
            .unwrap_or(0.0)
    }

    /// A random free orthogonal step for `entity`
    pub fn random_step_for(&mut self, entity: Entity) -> Option<Position> {
        let from = self.position_of(entity)?;
        ecs::random_step(from, &self.grid, &self.world, &mut self.rng)
    }

    /// Commit a move on the grid. The visual position is left where it was
    /// so the caller can interpolate towards the new cell.
    pub fn move_entity(&mut self, entity: Entity, to: Position) -> bool {
        match self.world.get::<&mut Position>(entity) {
            Ok(mut pos) => {
                *pos = to;
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_visual_position(&mut self, entity: Entity, at: (f32, f32)) {
        if let Ok(mut visual) = self.world.get::<&mut VisualPosition>(entity) {
            visual.x = at.0;
            visual.y = at.1;
        }
    }

    /// Whether a cell is inside the viewer's current light
    pub fn is_in_view(&self, pos: Position) -> bool {
        self.visibility.is_lit(pos.x, pos.y)
    }

    pub fn is_exit(&self, pos: Position) -> bool {
        self.grid.cell(pos.x, pos.y) == Some(Cell::Exit)
    }

    /// Recompute the fog of war from a (possibly fractional) viewer position
    pub fn refresh_visibility(&mut self, viewer: (f32, f32)) {
        self.visibility.refresh(viewer, &self.grid);
    }

    /// Land a hit and report it. Dead enemies are removed from the world
    /// right away; a dead player stays so the final screen can show it.
    pub fn damage(&mut self, source: Entity, target: Entity, amount: i32) -> Option<DamageOutcome> {
        let outcome = apply_damage(&mut self.world, target, amount)?;

        self.events.push(LevelEvent::HealthChanged {
            entity: target,
            current: outcome.current,
            max: outcome.max,
        });

        let was_player = target == self.player;
        let text = if was_player {
            format!("The {} hits you for {}.", self.name_of(source), outcome.dealt)
        } else {
            format!("You hit the {} for {}.", self.name_of(target), outcome.dealt)
        };
        self.events.push(LevelEvent::Message(text));

        if outcome.killed {
            let gold = self
                .world
                .get::<&GoldReward>(target)
                .map(|g| g.0)
                .unwrap_or(0);
            if !was_player {
                let name = self.name_of(target);
                self.events.push(LevelEvent::Message(format!("The {} dies.", name)));
                if let Err(e) = self.world.despawn(target) {
                    log::warn!("Failed to despawn {:?}: {}", target, e);
                }
                self.enemies.retain(|e| *e != target);
            }
            self.events.push(LevelEvent::Died { entity: target, was_player, gold });
        }

        Some(outcome)
    }

    pub fn push_event(&mut self, event: LevelEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Per-frame input
    // ------------------------------------------------------------------

    pub fn set_input(&mut self, input: TurnInput) {
        self.input = Some(input);
    }

    /// Consume the pending input
    pub fn take_input(&mut self) -> Option<TurnInput> {
        self.input.take()
    }

    pub fn clear_input(&mut self) {
        self.input = None;
    }

    pub fn set_frame_delta(&mut self, delta: Duration) {
        self.frame_delta = delta;
    }

    pub fn frame_delta(&self) -> Duration {
        self.frame_delta
    }

    /// Is this entity the player?
    pub fn is_player(&self, entity: Entity) -> bool {
        self.world.get::<&Player>(entity).is_ok()
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("floor", &self.floor)
            .field("seed", &self.seed)
            .field("player", &self.player)
            .field("enemies", &self.enemies.len())
            .finish()
    }
}
