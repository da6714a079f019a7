//! Dense cell grid and the mapping between grid cells and world space.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell (the `x` axis).
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell (the `y` axis, world `+Z`).
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Cardinal directions on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward increasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward decreasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

/// State of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Solid cell realised as a wall volume.
    Wall,
    /// Carved, walkable cell.
    Open,
}

/// Two-dimensional array of cells indexed `[column, row]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
}

impl MazeGrid {
    /// Allocates a grid with every cell set to [`Cell::Wall`].
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let count = (columns as usize).saturating_mul(rows as usize);
        Self {
            columns,
            rows,
            cells: vec![Cell::Wall; count],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the grid contains no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether signed coordinates address a cell inside the grid.
    #[must_use]
    pub fn contains(&self, column: i64, row: i64) -> bool {
        column >= 0 && row >= 0 && column < i64::from(self.columns) && row < i64::from(self.rows)
    }

    /// Converts signed coordinates into a cell when they fall inside the grid.
    #[must_use]
    pub fn coord(&self, column: i64, row: i64) -> Option<CellCoord> {
        if !self.contains(column, row) {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Clamps signed coordinates into the grid. Returns `None` only for an empty grid.
    #[must_use]
    pub fn clamp(&self, column: i64, row: i64) -> Option<CellCoord> {
        if self.is_empty() {
            return None;
        }
        let column = column.clamp(0, i64::from(self.columns) - 1);
        let row = row.clamp(0, i64::from(self.rows) - 1);
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Cell reached by moving `distance` steps from `cell` in `direction`.
    #[must_use]
    pub fn step(&self, cell: CellCoord, direction: Direction, distance: i64) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        self.coord(
            i64::from(cell.column()) + dx * distance,
            i64::from(cell.row()) + dy * distance,
        )
    }

    /// Retrieves the state of a cell, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the cell is in bounds and open.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.get(cell) == Some(Cell::Open)
    }

    /// Overwrites a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, state: Cell) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = state;
        }
    }

    /// Marks a cell as [`Cell::Open`].
    pub fn open(&mut self, cell: CellCoord) {
        self.set(cell, Cell::Open);
    }

    /// In-bounds cardinal neighbours of `cell` in [`Direction::ALL`] order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(cell, direction, 1))
    }

    /// Iterates every cell column by column, rows ascending within a column.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Cell)> + '_ {
        (0..self.columns).flat_map(move |column| {
            (0..self.rows).map(move |row| {
                let cell = CellCoord::new(column, row);
                (cell, self.cells[(row * self.columns + column) as usize])
            })
        })
    }

    /// Number of open cells.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell == Cell::Open).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        Some((cell.row() * self.columns + cell.column()) as usize)
    }
}

/// Placement of a grid in world space.
///
/// The grid is centred on `origin` in the XZ plane: column `0` starts at
/// `origin.x - width / 2` and row `0` at `origin.z - depth / 2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
    origin: Vec3,
    cell_size: f32,
    columns: u32,
    rows: u32,
}

impl GridTransform {
    /// Creates a transform for a `columns` x `rows` grid of square cells.
    #[must_use]
    pub const fn new(origin: Vec3, cell_size: f32, columns: u32, rows: u32) -> Self {
        Self {
            origin,
            cell_size,
            columns,
            rows,
        }
    }

    /// World-space centre of the grid.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total extent along X.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Total extent along Z.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// World-space corner of cell `(0, 0)` at the grid's height.
    #[must_use]
    pub fn min_corner(&self) -> Vec3 {
        self.origin - Vec3::new(self.width() / 2.0, 0.0, self.depth() / 2.0)
    }

    /// World-space centre of a cell at floor height. Accepts signed indices so
    /// perimeter segments just outside the grid can be positioned.
    #[must_use]
    pub fn center_of(&self, column: i64, row: i64) -> Vec3 {
        let half = self.cell_size / 2.0;
        self.min_corner()
            + Vec3::new(
                column as f32 * self.cell_size + half,
                0.0,
                row as f32 * self.cell_size + half,
            )
    }

    /// World-space centre of an in-grid cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec3 {
        self.center_of(i64::from(cell.column()), i64::from(cell.row()))
    }

    /// Signed cell indices containing the world point, without clamping.
    #[must_use]
    pub fn locate(&self, point: Vec3) -> (i64, i64) {
        if self.cell_size <= 0.0 {
            return (0, 0);
        }
        let local = point - self.min_corner();
        (
            (local.x / self.cell_size).floor() as i64,
            (local.z / self.cell_size).floor() as i64,
        )
    }

    /// Cell containing the world point, clamped into the grid bounds.
    ///
    /// Returns `None` only when the grid has no cells.
    #[must_use]
    pub fn cell_at(&self, point: Vec3) -> Option<CellCoord> {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        let (column, row) = self.locate(point);
        Some(CellCoord::new(
            column.clamp(0, i64::from(self.columns) - 1) as u32,
            row.clamp(0, i64::from(self.rows) - 1) as u32,
        ))
    }
}
