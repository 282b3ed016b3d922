//! Player entity creation

use hecs::{Entity, World};

use crate::config::PlayerConfig;
use crate::ecs::{
    Attack, BlocksMovement, Health, Mobility, Name, Player, Position, Renderable, Speed,
    VisualPosition,
};

/// Spawn the player entity.
///
/// `health` carries the pool over from the previous floor; a fresh player
/// starts at full health.
pub fn spawn_player(
    world: &mut World,
    pos: Position,
    config: &PlayerConfig,
    health: Option<Health>,
) -> Entity {
    world.spawn((
        Player,
        Name::new("You"),
        pos,
        VisualPosition::at(pos),
        Renderable::new('@', (255, 255, 200)).with_order(100),
        health.unwrap_or_else(|| Health::new(config.max_health)),
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
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_health_carries_over() {
        let mut world = World::new();
        let config = PlayerConfig::default();
        let fresh = spawn_player(&mut world, Position::new(1, 1), &config, None);
        assert_eq!(world.get::<&Health>(fresh).unwrap().current, config.max_health);

        let wounded = Health { current: 17, max: 100 };
        let carried = spawn_player(&mut world, Position::new(2, 2), &config, Some(wounded));
        assert_eq!(*world.get::<&Health>(carried).unwrap(), wounded);
        assert_eq!(world.get::<&VisualPosition>(carried).unwrap().rounded(), Position::new(2, 2));
    }
}
