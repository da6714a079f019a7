use std::collections::{HashSet, VecDeque};

use crawler_core::{CellCoord, Command, EnemyTier, MazeGrid, PrefabId};
use crawler_system_maze::{
    carve_passages, perimeter_segments, Config, MazeGeneration, Prefabs, Side,
};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn reachable_from(grid: &MazeGrid, start: CellCoord) -> HashSet<CellCoord> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    if grid.is_open(start) {
        let _ = seen.insert(start);
        queue.push_back(start);
    }
    while let Some(cell) = queue.pop_front() {
        for neighbor in grid.neighbors(cell) {
            if grid.is_open(neighbor) && seen.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
    seen
}

fn open_edges(grid: &MazeGrid) -> usize {
    grid.iter()
        .filter(|(cell, _)| grid.is_open(*cell))
        .map(|(cell, _)| {
            let east = grid.coord(i64::from(cell.column()) + 1, i64::from(cell.row()));
            let north = grid.coord(i64::from(cell.column()), i64::from(cell.row()) + 1);
            [east, north]
                .into_iter()
                .flatten()
                .filter(|neighbor| grid.is_open(*neighbor))
                .count()
        })
        .sum()
}

fn marker_for(config: &Config, column: u32, row: u32) -> Vec3 {
    let half_width = config.columns as f32 * config.cell_size / 2.0;
    let half_depth = config.rows as f32 * config.cell_size / 2.0;
    config.origin
        + Vec3::new(
            column as f32 * config.cell_size - half_width + config.cell_size / 2.0,
            0.0,
            row as f32 * config.cell_size - half_depth + config.cell_size / 2.0,
        )
}

fn config_with_markers(entrance: (u32, u32), boss: (u32, u32)) -> Config {
    let mut config = Config::default();
    config.entrance_marker = Some(marker_for(&config, entrance.0, entrance.1));
    config.boss_door_marker = Some(marker_for(&config, boss.0, boss.1));
    config
}

#[test]
fn every_open_cell_is_reachable_from_the_entrance() {
    let placements = [
        ((0, 0), (19, 19)),
        ((10, 0), (10, 19)),
        ((0, 7), (19, 12)),
        ((19, 4), (3, 3)),
        ((5, 19), (0, 10)),
        ((9, 9), (18, 1)),
    ];

    for seed in 0..8_u64 {
        for (entrance, boss) in placements {
            let mut generation =
                MazeGeneration::new(config_with_markers(entrance, boss), seed);
            let layout = generation.generate();
            let reachable = reachable_from(&layout.grid, layout.entrance);
            assert_eq!(
                reachable.len(),
                layout.grid.open_count(),
                "seed {seed} entrance {entrance:?} boss {boss:?} left isolated cells"
            );
            let door = layout.boss_door.expect("boss door marker supplied");
            assert!(reachable.contains(&door));
        }
    }
}

#[test]
fn carving_alone_produces_a_spanning_tree() {
    for seed in 0..16_u64 {
        let mut grid = MazeGrid::new(15, 13);
        let start = CellCoord::new(2, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        carve_passages(&mut grid, start, &mut rng);

        let open = grid.open_count();
        assert_eq!(reachable_from(&grid, start).len(), open);
        assert_eq!(open_edges(&grid), open - 1, "seed {seed} carved a cycle");
    }
}

#[test]
fn markers_outside_the_grid_are_clamped() {
    let mut config = Config::default();
    config.entrance_marker = Some(Vec3::new(-1_000.0, 0.0, -1_000.0));
    config.boss_door_marker = Some(Vec3::new(1_000.0, 0.0, 3.0));
    let mut generation = MazeGeneration::new(config, 42);
    let layout = generation.generate();

    assert_eq!(layout.entrance, CellCoord::new(0, 0));
    let door = layout.boss_door.expect("boss door");
    assert_eq!(door.column(), 19);
    assert!(door.row() < 20);
    assert!(layout.grid.is_open(layout.entrance));
    assert!(layout.grid.is_open(door));
}

#[test]
fn identical_seed_and_inputs_reproduce_the_layout() {
    let config = config_with_markers((0, 5), (19, 14));
    let first = MazeGeneration::new(config.clone(), 99).generate();
    let second = MazeGeneration::new(config.clone(), 99).generate();
    assert_eq!(first, second);

    let other = MazeGeneration::new(config, 100).generate();
    assert_ne!(first.grid, other.grid);
}

#[test]
fn perimeter_leaves_entrance_and_boss_door_gaps() {
    let mut generation = MazeGeneration::new(config_with_markers((0, 5), (19, 10)), 5);
    let layout = generation.generate();
    let segments = perimeter_segments(&layout, 3);

    let west_rows: HashSet<i64> = segments
        .iter()
        .filter(|segment| segment.side == Side::West)
        .map(|segment| segment.row)
        .collect();
    for row in 4..=6 {
        assert!(!west_rows.contains(&row), "entrance gap missing row {row}");
    }
    assert!(west_rows.contains(&3));
    assert!(west_rows.contains(&7));

    let east_rows: HashSet<i64> = segments
        .iter()
        .filter(|segment| segment.side == Side::East)
        .map(|segment| segment.row)
        .collect();
    assert!(!east_rows.contains(&10));
    assert_eq!(east_rows.len(), 19);

    assert_eq!(segments.len(), 4 * 20 - 3 - 1);
}

#[test]
fn interior_entrance_leaves_perimeter_closed() {
    let mut generation = MazeGeneration::new(config_with_markers((8, 8), (10, 10)), 5);
    let layout = generation.generate();
    assert_eq!(perimeter_segments(&layout, 3).len(), 4 * 20);
}

#[test]
fn missing_prefabs_skip_their_build_steps() {
    let mut generation = MazeGeneration::new(Config::default(), 3);
    let mut commands = Vec::new();
    let (layout, blueprint) = generation.run(&mut commands);

    assert!(blueprint.walls.is_empty());
    assert!(blueprint.perimeter.is_empty());
    assert!(blueprint.floor.is_none());
    assert!(blueprint.entrance_door.is_none());
    assert!(blueprint.boss_door.is_none());
    assert_eq!(blueprint.empty_cells.len(), layout.grid.open_count());
    assert_eq!(commands.len(), 2, "only layout and navigation commands");
}

#[test]
fn full_run_orders_layout_navigation_then_spawns() {
    let mut config = config_with_markers((0, 0), (19, 19));
    config.enemy_percentage = 100;
    config.prefabs = Prefabs {
        wall: Some(PrefabId::new("wall")),
        floor: Some(PrefabId::new("floor")),
        enemy: Some(PrefabId::new("enemy")),
        entrance_door: Some(PrefabId::new("entrance")),
        boss_door: Some(PrefabId::new("boss-door")),
    };
    let mut generation = MazeGeneration::new(config, 8);
    let mut commands = Vec::new();
    let (layout, blueprint) = generation.run(&mut commands);

    assert!(matches!(commands[0], Command::ConfigureDungeon { .. }));
    assert_eq!(commands[1], Command::RebuildNavigation);
    let spawns = commands[2..]
        .iter()
        .filter(|command| {
            matches!(
                command,
                Command::SpawnEnemy {
                    tier: EnemyTier::Regular,
                    ..
                }
            )
        })
        .count();
    assert_eq!(spawns, blueprint.empty_cells.len() - 6);

    let wall_cells = 20 * 20 - layout.grid.open_count();
    assert_eq!(blueprint.walls.len(), wall_cells);
    let floor = blueprint.floor.expect("floor slab");
    assert_eq!(floor.scale, Vec3::new(40.0, 0.1, 40.0));
    assert!(blueprint.entrance_door.is_some());
    let boss_door = blueprint.boss_door.expect("boss door placement");
    assert!((boss_door.position.y - 1.0).abs() < f32::EPSILON);
}

#[test]
fn degenerate_dimensions_produce_an_empty_layout() {
    let mut config = Config::default();
    config.columns = 0;
    let mut generation = MazeGeneration::new(config, 1);
    let mut commands = Vec::new();
    let (layout, blueprint) = generation.run(&mut commands);
    assert_eq!(layout.grid.open_count(), 0);
    assert!(blueprint.empty_cells.is_empty());
}
