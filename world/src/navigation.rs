//! Navigable surface derived from the open cells of the active layout.

use crawler_core::{CellCoord, GridTransform, MazeGrid};
use glam::Vec3;
use pathfinding::prelude::bfs;

/// Fraction of a cell kept clear along its edges when snapping points.
const EDGE_MARGIN: f32 = 0.25;

/// Snapshot of the walkable cells captured by the last navigation rebuild.
///
/// Every open cell contributes its full square footprint at floor height;
/// movement between cells is restricted to cardinal neighbours, mirroring
/// the corridors carved by maze generation.
#[derive(Clone, Debug)]
pub(crate) struct NavigationSurface {
    grid: MazeGrid,
    transform: GridTransform,
}

impl NavigationSurface {
    /// Captures the open cells of `grid` placed by `transform`.
    pub(crate) fn build(grid: &MazeGrid, transform: GridTransform) -> Self {
        Self {
            grid: grid.clone(),
            transform,
        }
    }

    /// Number of cells agents may traverse.
    #[must_use]
    pub(crate) fn navigable_cells(&self) -> usize {
        self.grid.open_count()
    }

    /// Open cell containing `point`, without clamping.
    #[must_use]
    pub(crate) fn cell_of(&self, point: Vec3) -> Option<CellCoord> {
        let (column, row) = self.transform.locate(point);
        self.grid
            .coord(column, row)
            .filter(|cell| self.grid.is_open(*cell))
    }

    /// Reports whether `point` stands on the navigable surface.
    #[must_use]
    pub(crate) fn contains(&self, point: Vec3) -> bool {
        self.cell_of(point).is_some()
    }

    /// Nearest point on the surface within `radius` of `point`.
    ///
    /// Candidates are clamped into each open cell's footprint, inset from
    /// its edges, at floor height. Ties keep the first cell in column-major
    /// order.
    #[must_use]
    pub(crate) fn sample(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if radius < 0.0 {
            return None;
        }

        let floor = self.transform.origin().y;
        let inset = self.transform.cell_size() * EDGE_MARGIN;
        let half = self.transform.cell_size() / 2.0 - inset;

        let mut best: Option<(f32, Vec3)> = None;
        for (cell, _) in self.grid.iter().filter(|(cell, _)| self.grid.is_open(*cell)) {
            let center = self.transform.cell_center(cell);
            let candidate = Vec3::new(
                point.x.clamp(center.x - half, center.x + half),
                floor,
                point.z.clamp(center.z - half, center.z + half),
            );
            let distance = candidate.distance(point);
            if distance > radius {
                continue;
            }
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    /// Waypoints leading from `from` to `to` through open cells.
    ///
    /// Intermediate waypoints are cell centres; the final waypoint is `to`
    /// projected onto the floor. Returns `None` when either endpoint lies off
    /// the surface or no route connects them.
    #[must_use]
    pub(crate) fn route(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        let start = self.cell_of(from)?;
        let goal = self.cell_of(to)?;

        let cells = bfs(
            &start,
            |cell| {
                self.grid
                    .neighbors(*cell)
                    .filter(|neighbor| self.grid.is_open(*neighbor))
                    .collect::<Vec<_>>()
            },
            |cell| *cell == goal,
        )?;

        let destination = Vec3::new(to.x, self.transform.origin().y, to.z);
        let mut waypoints: Vec<Vec3> = cells
            .iter()
            .skip(1)
            .take(cells.len().saturating_sub(2))
            .map(|cell| self.transform.cell_center(*cell))
            .collect();
        waypoints.push(destination);
        Some(waypoints)
    }
}
