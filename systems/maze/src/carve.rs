//! Grid carving: the randomized backtracker and the forced openings that
//! connect the entrance and the boss door.

use crawler_core::{CellCoord, Direction, MazeGrid};
use rand::{seq::SliceRandom, Rng};

/// Carves a perfect maze into `grid` starting from `start`.
///
/// Rooms share the parity of `start`; every carve opens the room two cells
/// away and the wall cell between them. The walk is the classic recursive
/// backtracker expressed with an explicit stack, so the visiting order and
/// the random draws match the recursive form exactly.
pub fn carve_passages<R: Rng + ?Sized>(grid: &mut MazeGrid, start: CellCoord, rng: &mut R) {
    if grid.get(start).is_none() {
        return;
    }

    grid.open(start);
    let mut stack = vec![Frame::enter(start, rng)];

    while let Some(frame) = stack.last_mut() {
        let Some(direction) = frame.next_direction() else {
            let _ = stack.pop();
            continue;
        };
        let cell = frame.cell;

        let Some(neighbor) = grid.step(cell, direction, 2) else {
            continue;
        };
        if grid.is_open(neighbor) {
            continue;
        }

        if let Some(between) = grid.step(cell, direction, 1) {
            grid.open(between);
        }
        grid.open(neighbor);
        stack.push(Frame::enter(neighbor, rng));
    }
}

struct Frame {
    cell: CellCoord,
    directions: [Direction; 4],
    cursor: usize,
}

impl Frame {
    fn enter<R: Rng + ?Sized>(cell: CellCoord, rng: &mut R) -> Self {
        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        Self {
            cell,
            directions,
            cursor: 0,
        }
    }

    fn next_direction(&mut self) -> Option<Direction> {
        let direction = self.directions.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(direction)
    }
}

/// Forces the entrance open and widens it so it never faces a wall.
///
/// On the bottom or top row the cells to either side open together with
/// the cell one step inward; elsewhere the cells above and below open
/// together with the neighbouring cell toward the interior.
pub fn widen_entrance(grid: &mut MazeGrid, start: CellCoord) {
    if grid.get(start).is_none() {
        return;
    }
    grid.open(start);

    let column = i64::from(start.column());
    let row = i64::from(start.row());
    let last_row = i64::from(grid.rows()) - 1;

    let openings = if row == 0 || row == last_row {
        let inward = if row == 0 { 1 } else { -1 };
        [(column - 1, row), (column + 1, row), (column, row + inward)]
    } else {
        let inward = if column == 0 { 1 } else { -1 };
        [(column, row - 1), (column, row + 1), (column + inward, row)]
    };

    for (column, row) in openings {
        if let Some(cell) = grid.coord(column, row) {
            grid.open(cell);
        }
    }
}

/// Corridor orientation detected around the boss door.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corridor {
    /// Open cells lie only to the west or east of the door.
    Horizontal,
    /// Any other configuration, including an isolated door.
    Vertical,
}

/// Opens the boss-door cell and exactly one neighbour linking it to the maze.
///
/// The neighbour is taken along the corridor axis detected around the door,
/// preferring a neighbour that is already open. Returns the detected
/// orientation so the door can be rotated to match.
pub fn connect_boss_door(grid: &mut MazeGrid, door: CellCoord) -> Corridor {
    grid.open(door);

    let is_open = |grid: &MazeGrid, direction| {
        grid.step(door, direction, 1)
            .map_or(false, |cell| grid.is_open(cell))
    };
    let horizontal = is_open(grid, Direction::West) || is_open(grid, Direction::East);
    let vertical = is_open(grid, Direction::South) || is_open(grid, Direction::North);

    let (corridor, preference) = if horizontal && !vertical {
        (
            Corridor::Horizontal,
            [
                Direction::West,
                Direction::East,
                Direction::South,
                Direction::North,
            ],
        )
    } else {
        (
            Corridor::Vertical,
            [
                Direction::South,
                Direction::North,
                Direction::West,
                Direction::East,
            ],
        )
    };

    let candidates: Vec<CellCoord> = preference
        .into_iter()
        .filter_map(|direction| grid.step(door, direction, 1))
        .collect();
    let chosen = candidates
        .iter()
        .copied()
        .find(|cell| grid.is_open(*cell))
        .or_else(|| candidates.first().copied());

    if let Some(cell) = chosen {
        grid.open(cell);
    }
    corridor
}
