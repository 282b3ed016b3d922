//! Grid model
//!
//! The authoritative 2D cell array and room list for one dungeon level.
//! Pure data plus queries; only the generator writes to it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::cell::Cell;
use crate::ecs::Position;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangular room (origin + size, in cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Room {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// One past the last row
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Strict overlap: rooms that only share an edge do not intersect.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

/// A generated dungeon level
///
/// Every constructed grid gets a fresh id; clones keep it. Equality looks at
/// the layout only.
#[derive(Debug, Clone)]
pub struct GridModel {
    id: u64,
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    /// Acceptance order: first holds the entry, last holds the exit
    rooms: Vec<Room>,
    entry: Option<Position>,
    exit: Option<Position>,
}

impl GridModel {
    /// Create a grid with every cell Empty
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, Cell::Empty)
    }

    /// Create a grid with every cell set to `cell`
    pub fn filled(width: i32, height: i32, cell: Cell) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            id: NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            cells: vec![cell; (width as usize).saturating_mul(height as usize)],
            rooms: Vec::new(),
            entry: None,
            exit: None,
        }
    }

    /// Identity of this level's layout
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Total number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert 2D coordinates to 1D index
    #[inline]
    pub fn xy_to_idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Convert 1D index to 2D coordinates
    #[inline]
    pub fn idx_to_xy(&self, idx: usize) -> (i32, i32) {
        let idx = idx as i32;
        (idx % self.width, idx / self.width)
    }

    /// Check if coordinates are within bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Cell state at a position, `None` when out of range
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        if self.in_bounds(x, y) {
            Some(self.cells[self.xy_to_idx(x, y)])
        } else {
            None
        }
    }

    /// Row-major view of every cell
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Check if a position is walkable. Out-of-range is never walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).map_or(false, |c| c.is_walkable())
    }

    pub fn is_walkable_at(&self, pos: Position) -> bool {
        self.is_walkable(pos.x, pos.y)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Where the viewer starts; `None` only when no room was accepted
    pub fn entry_position(&self) -> Option<Position> {
        self.entry
    }

    pub fn exit_position(&self) -> Option<Position> {
        self.exit
    }

    /// Every cell whose state is exactly Floor, row-major
    pub fn floor_cell_positions(&self) -> Vec<Position> {
        self.positions_where(|c| c == Cell::Floor)
    }

    /// Every Floor/Entry/Exit cell, row-major
    pub fn walkable_positions(&self) -> Vec<Position> {
        self.positions_where(|c| c.is_walkable())
    }

    fn positions_where(&self, pred: impl Fn(Cell) -> bool) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| pred(**cell))
            .map(|(idx, _)| {
                let (x, y) = self.idx_to_xy(idx);
                Position::new(x, y)
            })
            .collect()
    }

    /// Number of cells in a given state
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    /// In-bounds 8-connected neighbours of a cell
    pub fn neighbors8(&self, x: i32, y: i32) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                self.cell(nx, ny).map(|c| (nx, ny, c))
            })
    }

    /// Render the grid as text, one row per line (debugging and logs)
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.cells[self.xy_to_idx(x, y)].glyph());
            }
            out.push('\n');
        }
        out
    }

    // ------------------------------------------------------------------
    // Generation-time mutation
    // ------------------------------------------------------------------

    pub(crate) fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if self.in_bounds(x, y) {
            let idx = self.xy_to_idx(x, y);
            self.cells[idx] = cell;
        }
    }

    pub(crate) fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub(crate) fn set_entry(&mut self, pos: Position) {
        self.set(pos.x, pos.y, Cell::Entry);
        self.entry = Some(pos);
    }

    pub(crate) fn set_exit(&mut self, pos: Position) {
        self.set(pos.x, pos.y, Cell::Exit);
        self.exit = Some(pos);
    }
}

impl PartialEq for GridModel {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.cells == other.cells
            && self.rooms == other.rooms
            && self.entry == other.entry
            && self.exit == other.exit
    }
}

impl Eq for GridModel {}

impl fmt::Display for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}
