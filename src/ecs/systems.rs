//! ECS Systems
//!
//! Queries that combine the level grid with entity positions.

use hecs::{Entity, World};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::ecs::{BlocksMovement, Enemy, Position};
use crate::world::GridModel;

/// Get entity at position (if any blocking entity exists)
pub fn blocking_entity_at(world: &World, pos: Position) -> Option<Entity> {
    world
        .query::<(&Position, &BlocksMovement)>()
        .iter()
        .find(|(_, (entity_pos, _))| **entity_pos == pos)
        .map(|(entity, _)| entity)
}

/// Enemy standing on a cell, if any
pub fn enemy_at(world: &World, pos: Position) -> Option<Entity> {
    world
        .query::<(&Position, &Enemy)>()
        .iter()
        .find(|(_, (entity_pos, _))| **entity_pos == pos)
        .map(|(entity, _)| entity)
}

/// Check if a position is free to step onto: walkable and unoccupied
pub fn is_valid_move(pos: Position, grid: &GridModel, world: &World) -> bool {
    grid.is_walkable_at(pos) && blocking_entity_at(world, pos).is_none()
}

/// Orthogonal steps available from `from`
pub fn valid_moves(from: Position, grid: &GridModel, world: &World) -> Vec<Position> {
    from.cardinal_neighbors()
        .into_iter()
        .filter(|pos| is_valid_move(*pos, grid, world))
        .collect()
}

/// Pick one of the available orthogonal steps uniformly
pub fn random_step<R: Rng>(
    from: Position,
    grid: &GridModel,
    world: &World,
    rng: &mut R,
) -> Option<Position> {
    valid_moves(from, grid, world).choose(rng).copied()
}

/// Enemies still standing on the level
pub fn enemy_count(world: &World) -> usize {
    world.query::<&Enemy>().iter().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Cell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blocked_cells_are_not_valid_moves() {
        let grid = GridModel::filled(3, 3, Cell::Floor);
        let mut world = World::new();
        world.spawn((Position::new(1, 0), BlocksMovement));

        let moves = valid_moves(Position::new(1, 1), &grid, &world);
        assert_eq!(moves.len(), 3);
        assert!(!moves.contains(&Position::new(1, 0)));

        // Corners only have two in-bounds neighbours
        assert_eq!(valid_moves(Position::new(0, 2), &grid, &world).len(), 2);
    }

    #[test]
    fn test_walls_block_moves() {
        let mut grid = GridModel::filled(3, 1, Cell::Floor);
        grid.set(2, 0, Cell::Wall);
        let world = World::new();
        assert!(!is_valid_move(Position::new(2, 0), &grid, &world));
        assert!(!is_valid_move(Position::new(-1, 0), &grid, &world));
        assert!(is_valid_move(Position::new(0, 0), &grid, &world));
    }

    #[test]
    fn test_random_step_stays_legal() {
        let grid = GridModel::filled(5, 5, Cell::Floor);
        let world = World::new();
        let mut rng = StdRng::seed_from_u64(4);
        let from = Position::new(2, 2);
        for _ in 0..50 {
            let step = random_step(from, &grid, &world, &mut rng).unwrap();
            assert_eq!(step.distance(&from), 1);
        }

        let boxed_in = GridModel::filled(1, 1, Cell::Floor);
        assert_eq!(random_step(Position::new(0, 0), &boxed_in, &world, &mut rng), None);
    }

    #[test]
    fn test_enemy_lookup() {
        let mut world = World::new();
        let far = world.spawn((Position::new(9, 9), Enemy));
        world.spawn((Position::new(2, 1), Enemy));
        world.spawn((Position::new(1, 1), BlocksMovement));

        assert_eq!(enemy_at(&world, Position::new(9, 9)), Some(far));
        assert_eq!(enemy_at(&world, Position::new(1, 1)), None);
        assert_eq!(enemy_count(&world), 2);
    }
}
