//! Damage calculation
//!
//! Damage rolls and applying them to entities.

use hecs::{Entity, World};
use rand::Rng;

use crate::ecs::Health;

/// Spread of a damage roll around the attack power
pub const DAMAGE_SPREAD: i32 = 2;

/// Roll damage uniformly in `[power - 2, power + 2]`, never below 1
pub fn roll_damage(power: i32, rng: &mut impl Rng) -> i32 {
    let low = power - DAMAGE_SPREAD;
    let high = power + DAMAGE_SPREAD;
    rng.gen_range(low..=high).max(1)
}

/// What happened when damage landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Damage actually taken after clamping to the remaining pool
    pub dealt: i32,
    pub current: i32,
    pub max: i32,
    pub killed: bool,
}

/// Apply damage to an entity's health pool.
/// Returns `None` if the entity is gone or has no health.
pub fn apply_damage(world: &mut World, target: Entity, amount: i32) -> Option<DamageOutcome> {
    let mut health = world.get::<&mut Health>(target).ok()?;
    let dealt = health.take_damage(amount);
    Some(DamageOutcome {
        dealt,
        current: health.current,
        max: health.max,
        killed: health.is_dead(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let dmg = roll_damage(10, &mut rng);
            assert!((8..=12).contains(&dmg));
            seen[(dmg - 8) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_roll_never_below_one() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(roll_damage(0, &mut rng) >= 1);
            assert!(roll_damage(-10, &mut rng) >= 1);
        }
    }

    #[test]
    fn test_apply_damage() {
        let mut world = World::new();
        let target = world.spawn((Health::new(10),));

        let hit = apply_damage(&mut world, target, 4).unwrap();
        assert_eq!(hit, DamageOutcome { dealt: 4, current: 6, max: 10, killed: false });

        let kill = apply_damage(&mut world, target, 50).unwrap();
        assert_eq!(kill.dealt, 6);
        assert!(kill.killed);

        let bystander = world.spawn((0u8,));
        assert_eq!(apply_damage(&mut world, bystander, 1), None);
    }
}
