//! Room and corridor dungeon generator
//!
//! Classic layout: non-overlapping rectangular rooms, each chained to the
//! previously accepted one by an L-shaped corridor, then walled in.

use rand::Rng;

use super::GeneratorConfig;
use crate::ecs::Position;
use crate::world::{Cell, GridModel, Room};

/// Run the full pipeline: rooms, corridors, walls, entry/exit.
pub fn generate_rooms_and_corridors<R: Rng>(rng: &mut R, config: &GeneratorConfig) -> GridModel {
    let mut grid = GridModel::new(config.width, config.height);

    place_rooms(rng, &mut grid, config);

    let rooms = grid.rooms().to_vec();
    for pair in rooms.windows(2) {
        connect_rooms(rng, &mut grid, &pair[0], &pair[1], config.corridor_width);
    }

    infer_walls(&mut grid);
    place_entry_and_exit(&mut grid);

    grid
}

/// Sample `room_attempts` candidate rooms and keep those that overlap nothing.
fn place_rooms<R: Rng>(rng: &mut R, grid: &mut GridModel, config: &GeneratorConfig) {
    let (width, height) = (grid.width(), grid.height());

    for _ in 0..config.room_attempts {
        let w = rng.gen_range(config.min_room_size..=config.max_room_size);
        let h = rng.gen_range(config.min_room_size..=config.max_room_size);

        // Keep a one-cell border on every side
        let max_x = width - w - 1;
        let max_y = height - h - 1;
        if max_x < 1 || max_y < 1 {
            continue;
        }

        let x = rng.gen_range(1..=max_x);
        let y = rng.gen_range(1..=max_y);
        let candidate = Room::new(x, y, w, h);

        if grid.rooms().iter().any(|r| candidate.intersects(r)) {
            continue;
        }

        carve_room(grid, &candidate);
        grid.push_room(candidate);
    }
}

/// Paint a room's interior as floor
fn carve_room(grid: &mut GridModel, room: &Room) {
    for y in room.y..room.bottom() {
        for x in room.x..room.right() {
            grid.set(x, y, Cell::Floor);
        }
    }
}

/// Join two room centres with an L-shaped corridor, elbow chosen 50/50.
fn connect_rooms<R: Rng>(rng: &mut R, grid: &mut GridModel, from: &Room, to: &Room, width: i32) {
    let a = from.center();
    let b = to.center();

    if rng.gen_bool(0.5) {
        carve_h_corridor(grid, a.x, b.x, a.y, width);
        carve_v_corridor(grid, a.y, b.y, b.x, width);
    } else {
        carve_v_corridor(grid, a.y, b.y, a.x, width);
        carve_h_corridor(grid, a.x, b.x, b.y, width);
    }
}

/// Perpendicular offsets covering exactly `width` cells around the centre line
fn thickness_offsets(width: i32) -> std::ops::RangeInclusive<i32> {
    let width = width.max(1);
    let start = -(width - 1) / 2;
    start..=start + width - 1
}

/// Carve a horizontal run, thickened vertically
fn carve_h_corridor(grid: &mut GridModel, x1: i32, x2: i32, y: i32, width: i32) {
    for x in x1.min(x2)..=x1.max(x2) {
        for dy in thickness_offsets(width) {
            grid.set(x, y + dy, Cell::Floor);
        }
    }
}

/// Carve a vertical run, thickened horizontally
fn carve_v_corridor(grid: &mut GridModel, y1: i32, y2: i32, x: i32, width: i32) {
    for y in y1.min(y2)..=y1.max(y2) {
        for dx in thickness_offsets(width) {
            grid.set(x + dx, y, Cell::Floor);
        }
    }
}

/// Any empty cell touching floor (8-connected) becomes wall.
fn infer_walls(grid: &mut GridModel) {
    let mut walls = Vec::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.cell(x, y) != Some(Cell::Empty) {
                continue;
            }
            if grid.neighbors8(x, y).any(|(_, _, c)| c == Cell::Floor) {
                walls.push((x, y));
            }
        }
    }
    for (x, y) in walls {
        grid.set(x, y, Cell::Wall);
    }
}

/// Entry at the first room's centre, exit at the last room's centre.
///
/// With a single room both land on the same cell; the exit is painted last
/// and wins the cell state, while the entry position is still recorded.
fn place_entry_and_exit(grid: &mut GridModel) {
    let (first, last) = match (grid.rooms().first(), grid.rooms().last()) {
        (Some(first), Some(last)) => (first.center(), last.center()),
        _ => return,
    };
    grid.set_entry(first);
    grid.set_exit(last);
}

/// Cells reachable from `start` through 4-connected walkable steps
pub fn reachable_from(grid: &GridModel, start: Position) -> Vec<Position> {
    use std::collections::VecDeque;

    if !grid.is_walkable_at(start) {
        return Vec::new();
    }

    let mut seen = vec![false; grid.len()];
    let mut queue = VecDeque::new();
    let mut reached = Vec::new();

    seen[grid.xy_to_idx(start.x, start.y)] = true;
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        reached.push(pos);
        for next in pos.cardinal_neighbors() {
            if !grid.is_walkable_at(next) {
                continue;
            }
            let idx = grid.xy_to_idx(next.x, next.y);
            if !seen[idx] {
                seen[idx] = true;
                queue.push_back(next);
            }
        }
    }

    reached
}
