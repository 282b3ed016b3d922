//! Cell definitions
//!
//! The logical state of a single grid cell.

use serde::{Deserialize, Serialize};

/// State of one grid cell. Exactly one state per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Outside the play area; never walkable, never drawn as wall
    #[default]
    Empty,
    Floor,
    Wall,
    /// Where the viewer starts the level
    Entry,
    /// Stairs down to the next floor
    Exit,
}

impl Cell {
    pub fn is_walkable(&self) -> bool {
        matches!(self, Cell::Floor | Cell::Entry | Cell::Exit)
    }

    /// ASCII glyph, used by the text dump and the ASCII render mode
    pub fn glyph(&self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Floor => '.',
            Cell::Wall => '#',
            Cell::Entry => '<',
            Cell::Exit => '>',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkable_states() {
        assert!(Cell::Floor.is_walkable());
        assert!(Cell::Entry.is_walkable());
        assert!(Cell::Exit.is_walkable());
        assert!(!Cell::Wall.is_walkable());
        assert!(!Cell::Empty.is_walkable());
    }
}
