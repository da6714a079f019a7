//! Single-line transfer strings for carved dungeon layouts:
//! `dungeon:v1:<columns>x<rows>:<base64 json>`.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use crawler_core::{Cell, CellCoord, GridTransform, MazeGrid};
use crawler_system_maze::{connect_boss_door, Corridor, MazeLayout};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "dungeon";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "dungeon:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

const OPEN: char = '.';
const WALL: char = '#';

/// Carved grid together with its entrance and boss door.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DungeonLayoutSnapshot {
    pub(crate) grid: MazeGrid,
    pub(crate) cell_size: f32,
    pub(crate) entrance: CellCoord,
    pub(crate) boss_door: Option<CellCoord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    cell_size: f32,
    entrance: CellCoord,
    boss_door: Option<CellCoord>,
    /// One string per row, row 0 first; `.` is open and `#` is wall.
    rows: Vec<String>,
}

/// Errors that can occur while encoding or decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    #[error("layout string was empty")]
    EmptyPayload,
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    #[error("layout string is missing the version")]
    MissingVersion,
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    #[error("layout string is missing the payload")]
    MissingPayload,
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("could not process layout payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("layout rows do not match {columns}x{rows}")]
    ShapeMismatch { columns: u32, rows: u32 },
    #[error("unexpected cell '{0}' in layout rows")]
    InvalidCell(char),
    #[error("cell size {0} is not positive")]
    InvalidCellSize(f32),
    #[error("cell ({column}, {row}) lies outside the grid")]
    CellOutOfBounds { column: u32, row: u32 },
}

impl DungeonLayoutSnapshot {
    /// Captures a generated layout.
    pub(crate) fn from_layout(layout: &MazeLayout) -> Self {
        Self {
            grid: layout.grid.clone(),
            cell_size: layout.transform.cell_size(),
            entrance: layout.entrance,
            boss_door: layout.boss_door,
        }
    }

    /// Rebuilds a layout centred on the world origin.
    pub(crate) fn into_layout(self) -> MazeLayout {
        let mut grid = self.grid;
        let transform = GridTransform::new(Vec3::ZERO, self.cell_size, grid.columns(), grid.rows());
        let boss_corridor = match self.boss_door {
            Some(door) => connect_boss_door(&mut grid, door),
            None => Corridor::Vertical,
        };
        MazeLayout {
            grid,
            transform,
            entrance: self.entrance,
            boss_door: self.boss_door,
            boss_corridor,
        }
    }

    /// Encodes the snapshot into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let columns = self.grid.columns();
        let rows = (0..self.grid.rows())
            .map(|row| {
                (0..columns)
                    .map(|column| {
                        if self.grid.is_open(CellCoord::new(column, row)) {
                            OPEN
                        } else {
                            WALL
                        }
                    })
                    .collect()
            })
            .collect();
        let payload = SerializableSnapshot {
            cell_size: self.cell_size,
            entrance: self.entrance,
            boss_door: self.boss_door,
            rows,
        };
        let json = serde_json::to_vec(&payload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{columns}x{}:{encoded}",
            self.grid.rows()
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts
            .next()
            .ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: SerializableSnapshot = serde_json::from_slice(&bytes)?;

        if !(decoded.cell_size.is_finite() && decoded.cell_size > 0.0) {
            return Err(LayoutTransferError::InvalidCellSize(decoded.cell_size));
        }
        let grid = parse_rows(&decoded.rows, columns, rows)?;
        let in_bounds = |cell: CellCoord| {
            if cell.column() < columns && cell.row() < rows {
                Ok(cell)
            } else {
                Err(LayoutTransferError::CellOutOfBounds {
                    column: cell.column(),
                    row: cell.row(),
                })
            }
        };

        Ok(Self {
            grid,
            cell_size: decoded.cell_size,
            entrance: in_bounds(decoded.entrance)?,
            boss_door: decoded.boss_door.map(in_bounds).transpose()?,
        })
    }
}

fn parse_rows(lines: &[String], columns: u32, rows: u32) -> Result<MazeGrid, LayoutTransferError> {
    let mismatch = || LayoutTransferError::ShapeMismatch { columns, rows };
    if lines.len() != rows as usize {
        return Err(mismatch());
    }

    let mut grid = MazeGrid::new(columns, rows);
    for (row, line) in (0..rows).zip(lines) {
        if line.chars().count() != columns as usize {
            return Err(mismatch());
        }
        for (column, symbol) in (0..columns).zip(line.chars()) {
            let state = match symbol {
                OPEN => Cell::Open,
                WALL => Cell::Wall,
                other => return Err(LayoutTransferError::InvalidCell(other)),
            };
            grid.set(CellCoord::new(column, row), state);
        }
    }
    Ok(grid)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(LayoutTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_snapshot() -> DungeonLayoutSnapshot {
        let mut grid = MazeGrid::new(4, 3);
        for column in 0..4 {
            for row in 0..3 {
                if row != 1 || column == 0 {
                    grid.open(CellCoord::new(column, row));
                }
            }
        }
        DungeonLayoutSnapshot {
            grid,
            cell_size: 2.0,
            entrance: CellCoord::new(0, 0),
            boss_door: Some(CellCoord::new(3, 2)),
        }
    }

    #[test]
    fn carved_layout_survives_transfer() {
        let snapshot = ring_snapshot();
        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:4x3:")));

        let decoded = DungeonLayoutSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(decoded, snapshot);
        assert!(!decoded.grid.is_open(CellCoord::new(2, 1)));
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        let error = DungeonLayoutSnapshot::decode("maze:v1:4x3:e30").unwrap_err();
        assert!(matches!(error, LayoutTransferError::InvalidPrefix(prefix) if prefix == "maze"));
    }

    #[test]
    fn header_dimensions_must_match_rows() {
        let encoded = ring_snapshot().encode().expect("snapshot encodes");
        let tampered = encoded.replacen(":4x3:", ":5x3:", 1);
        let error = DungeonLayoutSnapshot::decode(&tampered).unwrap_err();
        assert!(matches!(
            error,
            LayoutTransferError::ShapeMismatch {
                columns: 5,
                rows: 3
            }
        ));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let error = DungeonLayoutSnapshot::decode("dungeon:v1:0x3:e30").unwrap_err();
        assert!(matches!(error, LayoutTransferError::InvalidDimensions(_)));
    }
}
