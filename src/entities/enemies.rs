//! Enemy entity creation
//!
//! Enemy kinds and per-floor spawning.

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{EnemyConfig, LevelRules};
use crate::ecs::{
    Attack, BlocksMovement, Enemy, GoldReward, Health, Mobility, Name, Position, Renderable,
    Speed, VisualPosition,
};
use crate::world::GridModel;

/// Look of an enemy kind. Combat stats come from `EnemyConfig`.
pub struct EnemyDef {
    pub name: &'static str,
    pub glyph: char,
    pub fg: (u8, u8, u8),
    /// Added to the configured max health
    pub bonus_health: i32,
}

pub const CINDER_RAT: EnemyDef = EnemyDef {
    name: "Cinder Rat",
    glyph: 'r',
    fg: (170, 110, 80),
    bonus_health: -8,
};

pub const ASH_SKELETON: EnemyDef = EnemyDef {
    name: "Ash Skeleton",
    glyph: 's',
    fg: (210, 205, 185),
    bonus_health: 0,
};

pub const SMOLDER_GHOUL: EnemyDef = EnemyDef {
    name: "Smolder Ghoul",
    glyph: 'g',
    fg: (140, 170, 90),
    bonus_health: 8,
};

pub const SOOT_WRAITH: EnemyDef = EnemyDef {
    name: "Soot Wraith",
    glyph: 'W',
    fg: (160, 150, 220),
    bonus_health: 20,
};

/// Kinds that can appear on a floor; deeper floors add tougher ones
pub fn enemies_for_floor(floor: u32) -> Vec<&'static EnemyDef> {
    match floor {
        0..=2 => vec![&CINDER_RAT, &ASH_SKELETON],
        3..=5 => vec![&CINDER_RAT, &ASH_SKELETON, &SMOLDER_GHOUL],
        _ => vec![&ASH_SKELETON, &SMOLDER_GHOUL, &SOOT_WRAITH],
    }
}

/// Spawn an enemy from a definition at a given position
pub fn spawn_enemy(
    world: &mut World,
    def: &EnemyDef,
    pos: Position,
    config: &EnemyConfig,
    gold: u32,
) -> Entity {
    world.spawn((
        Enemy,
        Name::new(def.name),
        pos,
        VisualPosition::at(pos),
        Renderable::new(def.glyph, def.fg).with_order(50),
        Health::new((config.max_health + def.bonus_health).max(1)),
        Attack {
            power: config.attack_power,
            range: config.attack_range,
            speed: config.attack_speed,
        },
        Mobility {
            move_speed: config.move_speed,
        },
        Speed(config.speed),
        BlocksMovement,
        GoldReward(gold),
    ))
}

/// Random walkable cells at least `clearance` cells (chebyshev) from `avoid`.
///
/// Returns fewer than `count` when the level is too small.
pub fn spawn_positions(
    grid: &GridModel,
    avoid: Option<Position>,
    clearance: i32,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Position> {
    let mut positions: Vec<Position> = grid
        .walkable_positions()
        .into_iter()
        .filter(|pos| avoid.map_or(true, |a| pos.chebyshev_distance(&a) > clearance))
        .collect();
    positions.shuffle(rng);
    positions.truncate(count);
    positions
}

/// Spawn the floor's enemies, returns the spawned entities in spawn order
pub fn spawn_enemies_for_floor(
    world: &mut World,
    grid: &GridModel,
    floor: u32,
    config: &EnemyConfig,
    rules: &LevelRules,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let wanted = rules.enemy_count(floor);
    let positions = spawn_positions(grid, grid.entry_position(), rules.spawn_clearance, wanted, rng);
    if positions.len() < wanted {
        log::warn!(
            "Floor {} only has room for {} of {} enemies",
            floor,
            positions.len(),
            wanted
        );
    }

    let pool = enemies_for_floor(floor);
    let mut spawned = Vec::with_capacity(positions.len());
    for pos in positions {
        let Some(def) = pool.choose(rng) else {
            break;
        };
        spawned.push(spawn_enemy(world, def, pos, config, rules.gold_per_kill));
    }

    log::info!("Spawned {} enemies on floor {}", spawned.len(), floor);
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{generate, Cell, GeneratorConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_positions_keep_clear_of_entry() {
        let grid = GridModel::filled(10, 10, Cell::Floor);
        let mut rng = StdRng::seed_from_u64(2);
        let entry = Position::new(5, 5);
        let positions = spawn_positions(&grid, Some(entry), 2, 200, &mut rng);
        assert_eq!(positions.len(), 100 - 25);
        assert!(positions.iter().all(|p| p.chebyshev_distance(&entry) > 2));
    }

    #[test]
    fn test_floor_spawn_count_and_placement() {
        let grid = generate(&GeneratorConfig { width: 40, height: 40, ..GeneratorConfig::default() }, 8);
        let rules = LevelRules::default();
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(8);

        let spawned = spawn_enemies_for_floor(&mut world, &grid, 4, &EnemyConfig::default(), &rules, &mut rng);
        assert!(spawned.len() <= rules.enemy_count(4));
        for entity in spawned {
            let pos = *world.get::<&Position>(entity).unwrap();
            assert!(grid.is_walkable_at(pos));
            assert!(world.get::<&Health>(entity).unwrap().current > 0);
        }
    }

    #[test]
    fn test_empty_level_spawns_nothing() {
        let grid = GridModel::new(5, 5);
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        let spawned = spawn_enemies_for_floor(
            &mut world,
            &grid,
            1,
            &EnemyConfig::default(),
            &LevelRules::default(),
            &mut rng,
        );
        assert!(spawned.is_empty());
    }
}
