//! ECS Components
//!
//! All components attached to entities in a level's `hecs::World`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Position & Movement
// ============================================================================

/// Position on the level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance (allows diagonal)
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Straight-line distance
    pub fn euclidean_distance(&self, other: &Position) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// The four orthogonal neighbours (up, down, left, right)
    pub fn cardinal_neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.x, self.y - 1),
            Position::new(self.x, self.y + 1),
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
        ]
    }

    pub fn as_f32(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

/// Sub-cell position used while an entity is sliding between cells.
///
/// The grid `Position` is authoritative for movement legality; this is what
/// the viewer's light is cast from and what gets drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualPosition {
    pub x: f32,
    pub y: f32,
}

impl VisualPosition {
    pub fn at(pos: Position) -> Self {
        Self {
            x: pos.x as f32,
            y: pos.y as f32,
        }
    }

    pub fn as_tuple(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Nearest grid cell
    pub fn rounded(&self) -> Position {
        Position::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// Movement tuning
#[derive(Debug, Clone, Copy)]
pub struct Mobility {
    /// Cells per second while interpolating a step
    pub move_speed: f32,
}

impl Mobility {
    /// Seconds needed to slide `cells` cells
    pub fn travel_time(&self, cells: f32) -> f32 {
        if self.move_speed <= 0.0 {
            0.0
        } else {
            cells / self.move_speed
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Visual representation of an entity
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Character to display
    pub glyph: char,
    /// Foreground color (RGB)
    pub fg: (u8, u8, u8),
    /// Render order (higher = on top)
    pub render_order: i32,
}

impl Renderable {
    pub fn new(glyph: char, fg: (u8, u8, u8)) -> Self {
        Self {
            glyph,
            fg,
            render_order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }
}

// ============================================================================
// Identity & Naming
// ============================================================================

/// Name component for entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks an entity as the player (the viewer)
#[derive(Debug, Clone, Copy, Default)]
pub struct Player;

/// Marks an entity as an enemy
#[derive(Debug, Clone, Copy, Default)]
pub struct Enemy;

/// Marks an entity as blocking movement
#[derive(Debug, Clone, Copy, Default)]
pub struct BlocksMovement;

// ============================================================================
// Combat Stats
// ============================================================================

/// Health pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, clamped to the remaining pool. Returns damage actually taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.max(0).min(self.current);
        self.current -= actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn percentage(&self) -> f32 {
        if self.max <= 0 {
            return 0.0;
        }
        self.current as f32 / self.max as f32
    }
}

/// Melee attack profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attack {
    /// Centre of the damage roll
    pub power: i32,
    /// Reach in cells (euclidean)
    pub range: f32,
    /// Attacks per second; scales the recoil animation
    pub speed: f32,
}

impl Attack {
    pub fn in_reach(&self, from: Position, to: Position) -> bool {
        from.euclidean_distance(&to) <= self.range
    }

    /// Seconds the attacker spends recoiling after a swing
    pub fn recoil_time(&self) -> f32 {
        if self.speed <= 0.0 {
            0.25
        } else {
            0.25 / self.speed
        }
    }
}

/// Relative initiative; higher acts earlier when the queue is sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Speed(pub i32);

/// Gold dropped when this entity dies
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldReward(pub u32);
