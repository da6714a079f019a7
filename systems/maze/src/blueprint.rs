//! Realisation of a carved layout as geometry placements and spawn points.

use crawler_core::{Cell, CellCoord, MazeGrid, PrefabId};
use glam::Vec3;

use crate::{carve::Corridor, Config, MazeLayout};

const FLOOR_THICKNESS: f32 = 0.1;
const QUARTER_TURN: f32 = 90.0;

/// Instruction to instantiate one prefab.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Prefab to instantiate.
    pub prefab: PrefabId,
    /// World-space position.
    pub position: Vec3,
    /// Scale applied to the prefab. A `y` of one keeps the prefab's height.
    pub scale: Vec3,
    /// Rotation about the vertical axis in degrees.
    pub yaw_degrees: f32,
}

/// Side of the grid a perimeter segment runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Column `-1`.
    West,
    /// Column `columns`.
    East,
    /// Row `-1`.
    South,
    /// Row `rows`.
    North,
}

/// One wall segment of the perimeter ring, addressed in signed cell indices
/// just outside the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PerimeterSegment {
    /// Side of the grid the segment belongs to.
    pub side: Side,
    /// Signed column index.
    pub column: i64,
    /// Signed row index.
    pub row: i64,
}

/// Geometry and spawn points produced from a [`MazeLayout`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DungeonBlueprint {
    /// One wall volume per wall cell.
    pub walls: Vec<Placement>,
    /// Single floor slab covering the whole grid.
    pub floor: Option<Placement>,
    /// Perimeter ring segments.
    pub perimeter: Vec<Placement>,
    /// Doorway leading into the maze.
    pub entrance_door: Option<Placement>,
    /// Door in front of the boss room.
    pub boss_door: Option<Placement>,
    /// World-space centres of every open cell in column-major order.
    pub empty_cells: Vec<Vec3>,
}

/// Perimeter segments surrounding the grid, leaving a gap `entrance_width`
/// cells wide centred on the entrance and a single-cell gap at the boss door.
///
/// Gaps only appear on the sides the entrance or boss door actually touch.
#[must_use]
pub fn perimeter_segments(layout: &MazeLayout, entrance_width: u32) -> Vec<PerimeterSegment> {
    let grid = &layout.grid;
    let columns = i64::from(grid.columns());
    let rows = i64::from(grid.rows());
    let half = i64::from(entrance_width.max(1) / 2);
    let start_column = i64::from(layout.entrance.column());
    let start_row = i64::from(layout.entrance.row());
    let door = layout
        .boss_door
        .map(|cell| (i64::from(cell.column()), i64::from(cell.row())));

    let door_gap = |side: Side, column: i64, row: i64| {
        let Some((door_column, door_row)) = door else {
            return false;
        };
        match side {
            Side::West => door_column == 0 && door_row == row,
            Side::East => door_column == columns - 1 && door_row == row,
            Side::South => door_row == 0 && door_column == column,
            Side::North => door_row == rows - 1 && door_column == column,
        }
    };
    let entrance_gap = |side: Side, column: i64, row: i64| match side {
        Side::West => start_column == 0 && (start_row - row).abs() <= half,
        Side::East => start_column == columns - 1 && (start_row - row).abs() <= half,
        Side::South => start_row == 0 && (start_column - column).abs() <= half,
        Side::North => start_row == rows - 1 && (start_column - column).abs() <= half,
    };

    let mut segments = Vec::new();
    for row in 0..rows {
        for (side, column) in [(Side::West, -1), (Side::East, columns)] {
            if !entrance_gap(side, column, row) && !door_gap(side, column, row) {
                segments.push(PerimeterSegment { side, column, row });
            }
        }
    }
    for column in 0..columns {
        for (side, row) in [(Side::South, -1), (Side::North, rows)] {
            if !entrance_gap(side, column, row) && !door_gap(side, column, row) {
                segments.push(PerimeterSegment { side, column, row });
            }
        }
    }
    segments
}

/// World-space centres of the open cells, column by column.
#[must_use]
pub fn empty_cells(layout: &MazeLayout) -> Vec<Vec3> {
    layout
        .grid
        .iter()
        .filter(|(_, cell)| *cell == Cell::Open)
        .map(|(coord, _)| layout.transform.cell_center(coord))
        .collect()
}

pub(crate) fn build(config: &Config, layout: &MazeLayout) -> DungeonBlueprint {
    let transform = &layout.transform;
    let prefabs = &config.prefabs;

    let floor = prefabs.floor.as_ref().map(|prefab| Placement {
        prefab: prefab.clone(),
        position: transform.origin(),
        scale: Vec3::new(transform.width(), FLOOR_THICKNESS, transform.depth()),
        yaw_degrees: 0.0,
    });

    let (walls, perimeter) = match prefabs.wall.as_ref() {
        Some(prefab) => (
            wall_placements(prefab, layout),
            perimeter_segments(layout, config.entrance_width)
                .into_iter()
                .map(|segment| Placement {
                    prefab: prefab.clone(),
                    position: transform.center_of(segment.column, segment.row),
                    scale: Vec3::ONE,
                    yaw_degrees: match segment.side {
                        Side::West | Side::East => 0.0,
                        Side::South | Side::North => QUARTER_TURN,
                    },
                })
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let entrance_door = prefabs.entrance_door.as_ref().map(|prefab| Placement {
        prefab: prefab.clone(),
        position: transform.cell_center(layout.entrance)
            + entrance_push(&layout.grid, layout.entrance, config.entrance_door_offset),
        scale: Vec3::ONE,
        yaw_degrees: config.entrance_door_yaw,
    });

    let boss_door = match (prefabs.boss_door.as_ref(), layout.boss_door) {
        (Some(prefab), Some(cell)) => Some(Placement {
            prefab: prefab.clone(),
            position: transform.cell_center(cell) + Vec3::Y * config.boss_door_height,
            scale: Vec3::ONE,
            yaw_degrees: config.boss_door_yaw
                + match layout.boss_corridor {
                    Corridor::Horizontal => QUARTER_TURN,
                    Corridor::Vertical => 0.0,
                },
        }),
        _ => None,
    };

    DungeonBlueprint {
        walls,
        floor,
        perimeter,
        entrance_door,
        boss_door,
        empty_cells: empty_cells(layout),
    }
}

fn wall_placements(prefab: &PrefabId, layout: &MazeLayout) -> Vec<Placement> {
    let cell_size = layout.transform.cell_size();
    layout
        .grid
        .iter()
        .filter(|(_, cell)| *cell == Cell::Wall)
        .map(|(coord, _)| Placement {
            prefab: prefab.clone(),
            position: layout.transform.cell_center(coord),
            scale: Vec3::new(cell_size, 1.0, cell_size),
            yaw_degrees: 0.0,
        })
        .collect()
}

fn entrance_push(grid: &MazeGrid, entrance: CellCoord, offset: f32) -> Vec3 {
    let last_row = grid.rows().saturating_sub(1);
    if entrance.row() == 0 {
        Vec3::new(0.0, 0.0, -offset)
    } else if entrance.row() == last_row {
        Vec3::new(0.0, 0.0, offset)
    } else if entrance.column() == 0 {
        Vec3::new(-offset, 0.0, 0.0)
    } else {
        Vec3::new(offset, 0.0, 0.0)
    }
}
