//! Ray queries against wall cells and actor bodies.

use crawler_core::{Collider, GridTransform, MazeGrid, RayHit};
use glam::{Vec2, Vec3};

/// Upright cylinder approximating an actor's collision volume.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) collider: Collider,
    pub(crate) base: Vec3,
    pub(crate) radius: f32,
    pub(crate) height: f32,
}

impl Body {
    /// Distance along a normalised ray at which it enters the body.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let offset = Vec2::new(origin.x - self.base.x, origin.z - self.base.z);
        let planar = Vec2::new(direction.x, direction.z);
        let c = offset.length_squared() - self.radius * self.radius;

        let distance = if c <= 0.0 {
            0.0
        } else {
            let a = planar.length_squared();
            if a <= f32::EPSILON {
                return None;
            }
            let b = 2.0 * offset.dot(planar);
            let discriminant = b * b - 4.0 * a * c;
            if discriminant < 0.0 {
                return None;
            }
            let entry = (-b - discriminant.sqrt()) / (2.0 * a);
            if entry < 0.0 {
                return None;
            }
            entry
        };

        let height = origin.y + direction.y * distance - self.base.y;
        (0.0..=self.height).contains(&height).then_some(distance)
    }
}

/// First wall or body struck by a ray within `max_distance`.
///
/// Walls are full-height columns; cells outside the grid count as the
/// perimeter ring and block the ray as well.
pub(crate) fn cast(
    grid: &MazeGrid,
    transform: &GridTransform,
    bodies: &[Body],
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RayHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO || !origin.is_finite() || !(max_distance >= 0.0) {
        return None;
    }

    let wall = wall_distance(grid, transform, origin, direction, max_distance).map(|distance| {
        RayHit {
            collider: Collider::Wall,
            point: origin + direction * distance,
            distance,
        }
    });

    bodies
        .iter()
        .filter_map(|body| {
            body.intersect(origin, direction)
                .filter(|distance| *distance <= max_distance)
                .map(|distance| RayHit {
                    collider: body.collider,
                    point: origin + direction * distance,
                    distance,
                })
        })
        .chain(wall)
        .min_by(|left, right| left.distance.total_cmp(&right.distance))
}

/// Grid traversal in the XZ plane reporting where the ray enters a solid cell.
///
/// A ray without horizontal travel never leaves its cell and reports no wall.
fn wall_distance(
    grid: &MazeGrid,
    transform: &GridTransform,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<f32> {
    let cell_size = transform.cell_size();
    if cell_size <= 0.0 {
        return None;
    }

    let solid = |column: i64, row: i64| {
        grid.coord(column, row)
            .map_or(true, |cell| !grid.is_open(cell))
    };

    let local = origin - transform.min_corner();
    let (mut column, mut row) = transform.locate(origin);
    if solid(column, row) {
        return Some(0.0);
    }

    let axis = |position: f32, index: i64, step: f32| {
        if step > 0.0 {
            (
                1,
                ((index + 1) as f32 * cell_size - position) / step,
                cell_size / step,
            )
        } else if step < 0.0 {
            (
                -1,
                (index as f32 * cell_size - position) / step,
                -cell_size / step,
            )
        } else {
            (0, f32::INFINITY, f32::INFINITY)
        }
    };
    let (step_column, mut next_column, delta_column) = axis(local.x, column, direction.x);
    let (step_row, mut next_row, delta_row) = axis(local.z, row, direction.z);

    loop {
        let distance = next_column.min(next_row);
        if !distance.is_finite() || distance > max_distance {
            return None;
        }
        if next_column < next_row {
            column += step_column;
            next_column += delta_column;
        } else {
            row += step_row;
            next_row += delta_row;
        }
        if solid(column, row) {
            return Some(distance);
        }
    }
}
