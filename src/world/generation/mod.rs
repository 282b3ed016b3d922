//! Procedural level generation
//!
//! Rooms-and-corridors layouts, deterministic for a given seed.

pub mod rooms;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::GridModel;

/// Layout parameters for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub width: i32,
    pub height: i32,
    pub min_room_size: i32,
    pub max_room_size: i32,
    /// Upper bound on accepted rooms; rejected candidates are not retried
    pub room_attempts: u32,
    pub corridor_width: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            min_room_size: 3,
            max_room_size: 10,
            room_attempts: 20,
            corridor_width: 2,
        }
    }
}

impl GeneratorConfig {
    /// Clamp parameters into a range the generator can work with.
    ///
    /// Generation never fails, so bad values are repaired here rather than
    /// rejected.
    pub fn sanitized(&self) -> Self {
        let min_room_size = self.min_room_size.max(1);
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
            min_room_size,
            max_room_size: self.max_room_size.max(min_room_size),
            room_attempts: self.room_attempts,
            corridor_width: self.corridor_width.max(1),
        }
    }
}

/// When a level counts as too sparse to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenerationRules {
    /// Levels with fewer rooms are regenerated
    pub min_rooms: usize,
    /// Total generation attempts before the last result is accepted as-is
    pub max_attempts: u32,
}

impl Default for RegenerationRules {
    fn default() -> Self {
        Self {
            min_rooms: 2,
            max_attempts: 8,
        }
    }
}

/// Generate a level. Same config and seed always yield the same grid.
pub fn generate(config: &GeneratorConfig, seed: u64) -> GridModel {
    let sanitized = config.sanitized();
    if sanitized != *config {
        log::warn!("Generator config repaired: {:?} -> {:?}", config, sanitized);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let grid = rooms::generate_rooms_and_corridors(&mut rng, &sanitized);

    log::info!(
        "Generated {}x{} level (seed {}): {} rooms, {} floor cells",
        grid.width(),
        grid.height(),
        seed,
        grid.room_count(),
        grid.walkable_positions().len()
    );

    grid
}

/// Generate a level, retrying with derived seeds while it is too sparse.
///
/// Returns the grid and the seed that produced it. If every attempt is sparse
/// the last one is kept; a single-room level is still a valid level.
pub fn generate_usable(
    config: &GeneratorConfig,
    seed: u64,
    rules: &RegenerationRules,
) -> (GridModel, u64) {
    let attempts = rules.max_attempts.max(1);
    let mut attempt_seed = seed;
    let mut grid = generate(config, attempt_seed);

    for attempt in 1..attempts {
        if grid.room_count() >= rules.min_rooms {
            break;
        }
        log::warn!(
            "Level from seed {} has only {} rooms (want {}), regenerating",
            attempt_seed,
            grid.room_count(),
            rules.min_rooms
        );
        attempt_seed = derive_seed(seed, attempt as u64);
        grid = generate(config, attempt_seed);
    }

    (grid, attempt_seed)
}

/// Mix a base seed with a counter (floor number, retry index, ...)
pub fn derive_seed(base: u64, salt: u64) -> u64 {
    base ^ salt.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_repairs_bad_parameters() {
        let config = GeneratorConfig {
            width: 0,
            height: -4,
            min_room_size: 0,
            max_room_size: -3,
            room_attempts: 5,
            corridor_width: 0,
        }
        .sanitized();
        assert_eq!(config.width, 1);
        assert_eq!(config.height, 1);
        assert_eq!(config.min_room_size, 1);
        assert_eq!(config.max_room_size, 1);
        assert_eq!(config.corridor_width, 1);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = GeneratorConfig::default();
        for seed in [0, 1, 42, 9_999, u64::MAX] {
            assert_eq!(generate(&config, seed), generate(&config, seed));
        }
    }

    #[test]
    fn test_example_scenario_is_byte_identical() {
        let config = GeneratorConfig {
            width: 10,
            height: 10,
            min_room_size: 3,
            max_room_size: 4,
            room_attempts: 5,
            corridor_width: 1,
        };
        let a = generate(&config, 42);
        let b = generate(&config, 42);
        assert_eq!(a.cells(), b.cells());
        assert_eq!(a.rooms(), b.rooms());
        assert!(a.room_count() >= 1);
        assert!(a.room_count() <= 5);
    }

    #[test]
    fn test_generate_usable_meets_room_minimum_when_possible() {
        let config = GeneratorConfig::default();
        let rules = RegenerationRules { min_rooms: 3, max_attempts: 20 };
        let (grid, used_seed) = generate_usable(&config, 7, &rules);
        assert!(grid.room_count() >= 3);
        assert_eq!(generate(&config, used_seed), grid);
    }

    #[test]
    fn test_generate_usable_accepts_sparse_level_after_attempts() {
        let config = GeneratorConfig {
            width: 6,
            height: 6,
            min_room_size: 4,
            max_room_size: 4,
            room_attempts: 10,
            corridor_width: 1,
        };
        let rules = RegenerationRules { min_rooms: 5, max_attempts: 3 };
        let (grid, _) = generate_usable(&config, 3, &rules);
        assert_eq!(grid.room_count(), 1);
    }

    #[test]
    fn test_derive_seed_varies_with_salt() {
        assert_ne!(derive_seed(10, 0), derive_seed(10, 1));
        assert_ne!(derive_seed(10, 0), 10);
    }
}
