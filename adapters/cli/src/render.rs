//! ASCII rendering of the dungeon, north row first.

use crawler_core::{CellCoord, EnemyTier};
use crawler_system_maze::MazeLayout;
use crawler_world::{query, World};

const WALL: char = '#';
const OPEN: char = '.';
const ENTRANCE: char = 'S';
const BOSS_DOOR: char = 'D';
const PLAYER: char = '@';
const ENEMY: char = 'e';
const BOSS: char = 'B';

/// Draws walls, doors and every living actor. Actors are drawn over cells,
/// and the player over enemies.
pub(crate) fn render(layout: &MazeLayout, world: &World) -> String {
    let columns = layout.grid.columns() as usize;
    let rows = layout.grid.rows() as usize;
    let mut canvas: Vec<Vec<char>> = (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| {
                    if layout.grid.is_open(CellCoord::new(column as u32, row as u32)) {
                        OPEN
                    } else {
                        WALL
                    }
                })
                .collect()
        })
        .collect();

    let mut mark = |cell: Option<CellCoord>, symbol: char| {
        if let Some(cell) = cell {
            if let Some(slot) = canvas
                .get_mut(cell.row() as usize)
                .and_then(|line| line.get_mut(cell.column() as usize))
            {
                *slot = symbol;
            }
        }
    };

    mark(Some(layout.entrance), ENTRANCE);
    mark(layout.boss_door, BOSS_DOOR);
    for enemy in query::enemies(world) {
        if enemy.health.is_dead() {
            continue;
        }
        let symbol = match enemy.tier {
            EnemyTier::Regular => ENEMY,
            EnemyTier::Boss => BOSS,
        };
        mark(layout.transform.cell_at(enemy.position), symbol);
    }
    if let Some(target) = query::target(world) {
        mark(layout.transform.cell_at(target.position), PLAYER);
    }

    canvas
        .iter()
        .rev()
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{Command, GridTransform, MazeGrid};
    use crawler_system_maze::Corridor;
    use crawler_world as world;
    use glam::Vec3;

    #[test]
    fn draws_north_row_first_with_actors() {
        let mut grid = MazeGrid::new(3, 2);
        grid.open(CellCoord::new(0, 0));
        grid.open(CellCoord::new(1, 0));
        grid.open(CellCoord::new(2, 0));
        grid.open(CellCoord::new(2, 1));
        let transform = GridTransform::new(Vec3::ZERO, 2.0, 3, 2);
        let layout = MazeLayout {
            grid: grid.clone(),
            transform,
            entrance: CellCoord::new(0, 0),
            boss_door: Some(CellCoord::new(2, 1)),
            boss_corridor: Corridor::Vertical,
        };

        let mut world = World::new();
        let mut events = Vec::new();
        for command in [
            Command::ConfigureDungeon { grid, transform },
            Command::PlacePlayer {
                position: transform.cell_center(CellCoord::new(0, 0)),
            },
            Command::SpawnEnemy {
                position: transform.cell_center(CellCoord::new(1, 0)),
                tier: EnemyTier::Regular,
            },
        ] {
            world::apply(&mut world, command, &mut events);
        }

        assert_eq!(render(&layout, &world), "##D\n@e.");
    }
}
