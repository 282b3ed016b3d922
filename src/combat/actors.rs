//! Combatants and their turns
//!
//! `Combatant` is the handle the turn scheduler queues. Each variant starts
//! a small state machine that suspends while waiting for input or while a
//! step or swing is being animated.

use hecs::Entity;

use super::roll_damage;
use crate::ecs::{self, Position, Speed};
use crate::game::time::{Countdown, Tween};
use crate::game::turn::{Actable, TurnStatus, TurnTask};
use crate::game::{Level, LevelEvent, TurnInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combatant {
    Player(Entity),
    Enemy(Entity),
}

impl Combatant {
    pub fn entity(&self) -> Entity {
        match self {
            Combatant::Player(e) | Combatant::Enemy(e) => *e,
        }
    }
}

impl Actable<Level> for Combatant {
    fn is_alive(&self, level: &Level) -> bool {
        level.is_alive(self.entity())
    }

    fn speed(&self, level: &Level) -> i32 {
        level
            .world()
            .get::<&Speed>(self.entity())
            .map(|s| s.0)
            .unwrap_or(0)
    }

    fn take_turn(&self, _level: &mut Level) -> Box<dyn TurnTask<Level>> {
        match *self {
            Combatant::Player(entity) => Box::new(PlayerTurn::new(entity)),
            Combatant::Enemy(entity) => Box::new(EnemyTurn::new(entity)),
        }
    }
}

/// Turn a movement intent into a single grid step.
///
/// The intent is clamped to unit length, normalised, and each axis rounded,
/// so diagonals come out as diagonal steps. Zero or non-finite intents give
/// `None`.
pub fn step_from_intent(dx: f32, dy: f32) -> Option<(i32, i32)> {
    let len = (dx * dx + dy * dy).sqrt();
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    let step = ((dx / len).round() as i32, (dy / len).round() as i32);
    (step != (0, 0)).then_some(step)
}

/// Slide `entity` one cell to `to`: commit the grid position now and
/// interpolate the visual one. Off-screen moves are instant.
fn begin_step(level: &mut Level, entity: Entity, from: Position, to: Position) -> Tween {
    let start = level
        .visual_position_of(entity)
        .map(|v| v.as_tuple())
        .unwrap_or_else(|| from.as_f32());
    let duration = if level.is_player(entity) || level.is_in_view(from) || level.is_in_view(to) {
        level.step_time(entity)
    } else {
        0.0
    };

    level.move_entity(entity, to);
    Tween::new(start, to.as_f32(), duration)
}

#[derive(Debug, Clone, Copy)]
enum PlayerPhase {
    AwaitingInput,
    Moving { tween: Tween, target: Position },
    Recoil(Countdown),
}

/// The player's turn. Waits for input for as long as it takes.
#[derive(Debug)]
pub struct PlayerTurn {
    entity: Entity,
    phase: PlayerPhase,
}

impl PlayerTurn {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            phase: PlayerPhase::AwaitingInput,
        }
    }

    fn await_input(&mut self, level: &mut Level, pos: Position) -> TurnStatus {
        let (dx, dy) = match level.take_input() {
            None => return TurnStatus::Running,
            Some(TurnInput::Wait) => return TurnStatus::Done,
            Some(TurnInput::Move { dx, dy }) => (dx, dy),
        };
        let Some((sx, sy)) = step_from_intent(dx, dy) else {
            return TurnStatus::Running;
        };
        let target = Position::new(pos.x + sx, pos.y + sy);

        if let Some(enemy) = ecs::enemy_at(level.world(), target) {
            let Some(attack) = level.attack_of(self.entity) else {
                return TurnStatus::Done;
            };
            let amount = roll_damage(attack.power, level.rng());
            level.damage(self.entity, enemy, amount);
            self.phase = PlayerPhase::Recoil(Countdown::new(attack.recoil_time()));
            return TurnStatus::Running;
        }

        if !ecs::is_valid_move(target, level.grid(), level.world()) {
            // Bumping a wall costs nothing; keep waiting
            return TurnStatus::Running;
        }

        let tween = begin_step(level, self.entity, pos, target);
        self.phase = PlayerPhase::Moving { tween, target };
        TurnStatus::Running
    }
}

impl TurnTask<Level> for PlayerTurn {
    fn resume(&mut self, level: &mut Level) -> TurnStatus {
        let Some(pos) = level.position_of(self.entity) else {
            return TurnStatus::Done;
        };
        if !level.is_alive(self.entity) {
            return TurnStatus::Done;
        }

        let delta = level.frame_delta();
        match &mut self.phase {
            PlayerPhase::AwaitingInput => {}
            PlayerPhase::Moving { tween, target } => {
                let viewer = tween.advance(delta);
                level.set_visual_position(self.entity, viewer);
                level.refresh_visibility(viewer);

                if !tween.is_finished() {
                    return TurnStatus::Running;
                }
                if level.is_exit(*target) {
                    level.push_event(LevelEvent::ExitReached);
                }
                return TurnStatus::Done;
            }
            PlayerPhase::Recoil(wait) => {
                return if wait.advance(delta) {
                    TurnStatus::Done
                } else {
                    TurnStatus::Running
                };
            }
        }
        self.await_input(level, pos)
    }
}

#[derive(Debug, Clone, Copy)]
enum EnemyPhase {
    Deciding,
    Moving(Tween),
    Recoil(Countdown),
}

/// An enemy's turn: swing at the player if in reach, otherwise wander.
#[derive(Debug)]
pub struct EnemyTurn {
    entity: Entity,
    phase: EnemyPhase,
}

impl EnemyTurn {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            phase: EnemyPhase::Deciding,
        }
    }

    fn decide(&mut self, level: &mut Level, pos: Position) -> TurnStatus {
        let player = level.player();
        let target = level
            .player_position()
            .filter(|_| level.is_alive(player));
        let attack = level.attack_of(self.entity);

        if let (Some(target), Some(attack)) = (target, attack) {
            if attack.in_reach(pos, target) {
                let amount = roll_damage(attack.power, level.rng());
                level.damage(self.entity, player, amount);
                self.phase = EnemyPhase::Recoil(Countdown::new(attack.recoil_time()));
                return TurnStatus::Running;
            }
        }

        let Some(step) = level.random_step_for(self.entity) else {
            return TurnStatus::Done;
        };
        let tween = begin_step(level, self.entity, pos, step);
        if tween.is_finished() {
            level.set_visual_position(self.entity, tween.target());
            return TurnStatus::Done;
        }
        self.phase = EnemyPhase::Moving(tween);
        TurnStatus::Running
    }
}

impl TurnTask<Level> for EnemyTurn {
    fn resume(&mut self, level: &mut Level) -> TurnStatus {
        let Some(pos) = level.position_of(self.entity) else {
            return TurnStatus::Done;
        };
        if !level.is_alive(self.entity) {
            return TurnStatus::Done;
        }

        let delta = level.frame_delta();
        let finished = match &mut self.phase {
            EnemyPhase::Deciding => None,
            EnemyPhase::Moving(tween) => {
                let at = tween.advance(delta);
                level.set_visual_position(self.entity, at);
                Some(tween.is_finished())
            }
            EnemyPhase::Recoil(wait) => Some(wait.advance(delta)),
        };
        match finished {
            None => self.decide(level, pos),
            Some(true) => TurnStatus::Done,
            Some(false) => TurnStatus::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ecs::Health;
    use std::time::Duration;

    #[test]
    fn test_step_from_intent() {
        assert_eq!(step_from_intent(1.0, 0.0), Some((1, 0)));
        assert_eq!(step_from_intent(0.0, -3.5), Some((0, -1)));
        assert_eq!(step_from_intent(1.0, 1.0), Some((1, 1)));
        assert_eq!(step_from_intent(0.2, 0.9), Some((0, 1)));
        assert_eq!(step_from_intent(0.0, 0.0), None);
        assert_eq!(step_from_intent(f32::NAN, 1.0), None);
    }

    fn quiet_level() -> Level {
        let mut config = GameConfig::default();
        config.rules.min_enemies = 0;
        config.rules.enemies_per_floor = 0;
        Level::new(1, 5, &config, None)
    }

    /// A walkable cell next to the player, as a unit intent
    fn open_direction(level: &Level) -> (i32, i32) {
        let pos = level.player_position().unwrap();
        pos.cardinal_neighbors()
            .into_iter()
            .find(|n| level.grid().is_walkable_at(*n))
            .map(|n| (n.x - pos.x, n.y - pos.y))
            .unwrap()
    }

    #[test]
    fn test_player_turn_waits_for_input() {
        let mut level = quiet_level();
        let player = level.player();
        let mut turn = Combatant::Player(player).take_turn(&mut level);

        for _ in 0..10 {
            assert_eq!(turn.resume(&mut level), TurnStatus::Running);
        }
        level.set_input(TurnInput::Wait);
        assert_eq!(turn.resume(&mut level), TurnStatus::Done);
    }

    #[test]
    fn test_player_move_interpolates_then_finishes() {
        let mut level = quiet_level();
        let player = level.player();
        let start = level.player_position().unwrap();
        let (dx, dy) = open_direction(&level);
        let mut turn = PlayerTurn::new(player);

        level.set_input(TurnInput::Move { dx: dx as f32, dy: dy as f32 });
        assert_eq!(turn.resume(&mut level), TurnStatus::Running);
        let target = Position::new(start.x + dx, start.y + dy);
        assert_eq!(level.player_position(), Some(target));

        // Halfway through the slide the viewer is between cells
        let half = Duration::from_secs_f32(level.step_time(player) / 2.0);
        level.set_frame_delta(half);
        assert_eq!(turn.resume(&mut level), TurnStatus::Running);
        let visual = level.visual_position_of(player).unwrap();
        assert!(visual.x != start.x as f32 || visual.y != start.y as f32);
        assert!(visual.x != target.x as f32 || visual.y != target.y as f32);

        level.set_frame_delta(Duration::from_secs(1));
        assert_eq!(turn.resume(&mut level), TurnStatus::Done);
        assert_eq!(level.visual_position_of(player).unwrap().rounded(), target);
    }

    #[test]
    fn test_bump_attack_damages_enemy() {
        let mut level = quiet_level();
        let player = level.player();
        let pos = level.player_position().unwrap();
        let (dx, dy) = open_direction(&level);
        let spot = Position::new(pos.x + dx, pos.y + dy);
        let enemy = crate::entities::spawn_enemy(
            level.world_mut(),
            &crate::entities::enemies::ASH_SKELETON,
            spot,
            &GameConfig::default().enemies,
            5,
        );

        let mut turn = PlayerTurn::new(player);
        level.set_input(TurnInput::Move { dx: dx as f32, dy: dy as f32 });
        assert_eq!(turn.resume(&mut level), TurnStatus::Running);
        assert_eq!(level.player_position(), Some(pos));

        let hp = level.health_of(enemy).unwrap();
        assert!(hp.current < hp.max);
        assert!(level
            .drain_events()
            .iter()
            .any(|e| matches!(e, LevelEvent::HealthChanged { entity, .. } if *entity == enemy)));

        level.set_frame_delta(Duration::from_secs(1));
        assert_eq!(turn.resume(&mut level), TurnStatus::Done);
    }

    #[test]
    fn test_enemy_attacks_adjacent_player() {
        let mut level = quiet_level();
        let player = level.player();
        let pos = level.player_position().unwrap();
        let (dx, dy) = open_direction(&level);
        let enemy = crate::entities::spawn_enemy(
            level.world_mut(),
            &crate::entities::enemies::ASH_SKELETON,
            Position::new(pos.x + dx, pos.y + dy),
            &GameConfig::default().enemies,
            5,
        );

        let mut turn = Combatant::Enemy(enemy).take_turn(&mut level);
        assert_eq!(turn.resume(&mut level), TurnStatus::Running);
        let hp: Health = level.player_health().unwrap();
        assert!(hp.current < hp.max);
        assert!(level.drain_events().iter().any(|e| matches!(
            e,
            LevelEvent::HealthChanged { entity, current, .. }
                if *entity == player && *current == hp.current
        )));

        level.set_frame_delta(Duration::from_secs(1));
        assert_eq!(turn.resume(&mut level), TurnStatus::Done);
    }

    #[test]
    fn test_turn_of_missing_entity_finishes() {
        let mut level = quiet_level();
        let ghost = level.world_mut().spawn((Health::new(1),));
        level.world_mut().despawn(ghost).unwrap();
        let combatant = Combatant::Enemy(ghost);
        assert!(!combatant.is_alive(&level));
        let mut turn = combatant.take_turn(&mut level);
        assert_eq!(turn.resume(&mut level), TurnStatus::Done);
    }
}
