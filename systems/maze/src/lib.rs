#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dungeon layout generation: randomized backtracker carving, entrance and
//! boss-door openings, perimeter and wall realisation, and enemy placement.

use crawler_core::{CellCoord, Command, EnemyTier, GridTransform, MazeGrid, PrefabId};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

mod blueprint;
mod carve;

pub use blueprint::{
    empty_cells, perimeter_segments, DungeonBlueprint, PerimeterSegment, Placement, Side,
};
pub use carve::{carve_passages, connect_boss_door, widen_entrance, Corridor};

/// Prefabs used to realise the layout. A missing prefab skips its build step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prefabs {
    /// Wall volume used for wall cells and perimeter segments.
    pub wall: Option<PrefabId>,
    /// Floor slab stretched across the whole grid.
    pub floor: Option<PrefabId>,
    /// Enemy spawned on open cells.
    pub enemy: Option<PrefabId>,
    /// Door placed outside the entrance.
    pub entrance_door: Option<PrefabId>,
    /// Door placed on the boss-door cell.
    pub boss_door: Option<PrefabId>,
}

/// Tuning knobs for layout generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of grid columns.
    pub columns: u32,
    /// Number of grid rows.
    pub rows: u32,
    /// Side length of one cell in world units.
    pub cell_size: f32,
    /// World-space centre of the grid.
    pub origin: Vec3,
    /// World-space marker for the entrance. Cell `(0, 0)` when absent.
    pub entrance_marker: Option<Vec3>,
    /// World-space marker for the boss door. No boss door when absent.
    pub boss_door_marker: Option<Vec3>,
    /// Width of the perimeter gap at the entrance, in cells (1..=10).
    pub entrance_width: u32,
    /// Chance in percent (0..=100) that an eligible open cell spawns an enemy.
    pub enemy_percentage: u32,
    /// Number of open cells skipped at both ends of the spawn list.
    pub safe_zone: usize,
    /// Vertical offset applied to the boss door.
    pub boss_door_height: f32,
    /// Extra rotation applied to the boss door, in degrees.
    pub boss_door_yaw: f32,
    /// Distance the entrance door is pushed outward across the perimeter.
    pub entrance_door_offset: f32,
    /// Extra rotation applied to the entrance door, in degrees.
    pub entrance_door_yaw: f32,
    /// Prefabs realising the layout.
    pub prefabs: Prefabs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 20,
            cell_size: 2.0,
            origin: Vec3::ZERO,
            entrance_marker: None,
            boss_door_marker: None,
            entrance_width: 3,
            enemy_percentage: 10,
            safe_zone: 3,
            boss_door_height: 1.0,
            boss_door_yaw: 0.0,
            entrance_door_offset: 2.0,
            entrance_door_yaw: 0.0,
            prefabs: Prefabs::default(),
        }
    }
}

/// Carved grid plus the resolved entrance and boss-door cells.
#[derive(Clone, Debug, PartialEq)]
pub struct MazeLayout {
    /// Carved cells.
    pub grid: MazeGrid,
    /// World placement of the grid.
    pub transform: GridTransform,
    /// Entrance cell, clamped into bounds.
    pub entrance: CellCoord,
    /// Boss-door cell, clamped into bounds, when a marker was supplied.
    pub boss_door: Option<CellCoord>,
    /// Corridor orientation detected at the boss door.
    pub boss_corridor: Corridor,
}

/// System that builds a dungeon level from a [`Config`] and a seeded random stream.
#[derive(Debug)]
pub struct MazeGeneration {
    config: Config,
    rng: ChaCha8Rng,
}

impl MazeGeneration {
    /// Creates a generator whose random draws derive from `seed`.
    #[must_use]
    pub fn new(config: Config, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every generation step and queues the world commands that realise it:
    /// the dungeon layout, a navigation rebuild, then one spawn per enemy.
    pub fn run(&mut self, out: &mut Vec<Command>) -> (MazeLayout, DungeonBlueprint) {
        let layout = self.generate();
        let blueprint = self.instantiate(&layout);
        out.push(Command::ConfigureDungeon {
            grid: layout.grid.clone(),
            transform: layout.transform,
        });
        self.populate(&blueprint, out);
        (layout, blueprint)
    }

    /// Carves the grid and opens the entrance and boss door.
    pub fn generate(&mut self) -> MazeLayout {
        let config = &self.config;
        let transform =
            GridTransform::new(config.origin, config.cell_size, config.columns, config.rows);
        let mut grid = MazeGrid::new(config.columns, config.rows);

        let entrance = config
            .entrance_marker
            .and_then(|marker| transform.cell_at(marker))
            .unwrap_or(CellCoord::new(0, 0));
        let boss_door = config
            .boss_door_marker
            .and_then(|marker| transform.cell_at(marker));

        carve_passages(&mut grid, entrance, &mut self.rng);
        widen_entrance(&mut grid, entrance);

        let boss_corridor = match boss_door {
            Some(door) => connect_boss_door(&mut grid, door),
            None => Corridor::Vertical,
        };

        info!(
            columns = config.columns,
            rows = config.rows,
            open_cells = grid.open_count(),
            ?entrance,
            ?boss_door,
            "maze carved"
        );

        MazeLayout {
            grid,
            transform,
            entrance,
            boss_door,
            boss_corridor,
        }
    }

    /// Realises walls, floor, perimeter, doors and the empty-cell list.
    #[must_use]
    pub fn instantiate(&self, layout: &MazeLayout) -> DungeonBlueprint {
        let blueprint = blueprint::build(&self.config, layout);
        debug!(
            walls = blueprint.walls.len(),
            perimeter = blueprint.perimeter.len(),
            empty_cells = blueprint.empty_cells.len(),
            floor = blueprint.floor.is_some(),
            "dungeon instantiated"
        );
        blueprint
    }

    /// Queues a navigation rebuild followed by enemy spawns over the empty cells.
    pub fn populate(&mut self, blueprint: &DungeonBlueprint, out: &mut Vec<Command>) {
        out.push(Command::RebuildNavigation);

        if self.config.prefabs.enemy.is_none() {
            warn!("no enemy prefab configured; skipping enemy placement");
            return;
        }

        let spawns = plan_enemy_spawns(
            &blueprint.empty_cells,
            self.config.enemy_percentage,
            self.config.safe_zone,
            &mut self.rng,
        );
        info!(enemies = spawns.len(), "enemies placed");
        out.extend(spawns.into_iter().map(|position| Command::SpawnEnemy {
            position,
            tier: EnemyTier::Regular,
        }));
    }
}

/// Rolls an independent `percentage`-in-100 trial for every empty cell outside
/// the safe zone at both ends of the list, returning the spawn positions.
pub fn plan_enemy_spawns<R: Rng + ?Sized>(
    empty_cells: &[Vec3],
    percentage: u32,
    safe_zone: usize,
    rng: &mut R,
) -> Vec<Vec3> {
    let end = empty_cells.len().saturating_sub(safe_zone);
    if safe_zone >= end {
        return Vec::new();
    }

    empty_cells[safe_zone..end]
        .iter()
        .copied()
        .filter(|_| rng.gen_range(0..100) < percentage)
        .collect()
}
