//! Headless frame loop: the world applies commands, systems react to the
//! resulting events, and their commands feed back until nothing is left.

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    time::Duration,
};

use crawler_core::{
    stream_seed, Collider, Command, DamageTarget, Direction, EnemyTier, Event, WorldQuery,
    RNG_STREAM_ENEMY_AI, RNG_STREAM_LOOT, RNG_STREAM_MAZE, RNG_STREAM_TRAPS, TORSO_HEIGHT,
};
use crawler_system_enemy_ai::EnemyAi;
use crawler_system_loot::DropSystem;
use crawler_system_maze::{DungeonBlueprint, MazeGeneration, MazeLayout};
use crawler_system_progress::{
    apply_rewards, LevelPhase, LevelTracker, SessionProgress, SyncRequest,
};
use crawler_system_traps::Traps;
use crawler_world::{self as world, query, World};
use glam::Vec3;
use tracing::{debug, info, warn};

const MUZZLE_HEIGHT: f32 = 0.5;
const MUZZLE_FORWARD_OFFSET: f32 = 0.6;

/// Validated configuration for every system.
#[derive(Clone, Debug)]
pub(crate) struct Tuning {
    pub(crate) maze: crawler_system_maze::Config,
    pub(crate) enemy: crawler_system_enemy_ai::Config,
    pub(crate) loot: crawler_system_loot::Config,
    pub(crate) level: crawler_system_progress::Config,
    pub(crate) level_number: u32,
    pub(crate) gunner: GunnerConfig,
    pub(crate) traps: crawler_system_traps::Config,
    pub(crate) trap_layout: TrapLayout,
}

/// Trap placements as `(column, row)` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TrapLayout {
    pub(crate) launchers: Vec<((u32, u32), Direction)>,
    pub(crate) plates: Vec<(u32, u32)>,
}

/// Automatic player weapon used in place of input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GunnerConfig {
    pub(crate) damage: f32,
    pub(crate) range: f32,
    pub(crate) fire_interval: Duration,
}

/// Shoots the nearest enemy in the player's line of fire.
#[derive(Debug)]
struct Gunner {
    config: GunnerConfig,
    cooldown: Duration,
}

impl Gunner {
    fn new(config: GunnerConfig) -> Self {
        Self {
            config,
            cooldown: Duration::ZERO,
        }
    }

    fn handle(&mut self, events: &[Event], world: &World, out: &mut Vec<Command>) {
        for event in events {
            let Event::TimeAdvanced { dt } = event else {
                continue;
            };
            self.cooldown = self.cooldown.saturating_sub(*dt);
            if !self.cooldown.is_zero() {
                continue;
            }
            if let Some(command) = self.aim(world) {
                out.push(command);
                self.cooldown = self.config.fire_interval;
            }
        }
    }

    fn aim(&self, world: &World) -> Option<Command> {
        let player = query::target(world)?;
        let (_, enemy) = query::enemies(world)
            .into_iter()
            .filter(|enemy| !enemy.health.is_dead())
            .filter_map(|enemy| {
                let torso = enemy.position + Vec3::Y * TORSO_HEIGHT;
                let planar = Vec3::new(
                    torso.x - player.position.x,
                    0.0,
                    torso.z - player.position.z,
                )
                .normalize_or_zero();
                if planar == Vec3::ZERO {
                    return None;
                }
                let origin =
                    player.position + Vec3::Y * MUZZLE_HEIGHT + planar * MUZZLE_FORWARD_OFFSET;
                let hit = world.raycast(origin, torso - origin, self.config.range)?;
                (hit.collider == Collider::Enemy(enemy.id)).then_some((hit.distance, enemy.id))
            })
            .min_by(|left, right| left.0.total_cmp(&right.0))?;

        debug!(enemy = enemy.get(), "player fired");
        Some(Command::ApplyDamage {
            target: DamageTarget::Enemy(enemy),
            amount: self.config.damage,
        })
    }
}

/// One dungeon level driven by every system.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    layout: MazeLayout,
    blueprint: DungeonBlueprint,
    enemy_ai: EnemyAi,
    drops: DropSystem,
    tracker: LevelTracker,
    progress: SessionProgress,
    gunner: Gunner,
    traps: Traps,
    elapsed: Duration,
    journal: DefaultHasher,
    events_seen: u64,
}

impl Simulation {
    /// Builds the level from `imported`, or generates one, then places the
    /// player at the entrance and a boss at the boss door.
    pub(crate) fn new(tuning: Tuning, seed: u64, imported: Option<MazeLayout>) -> Self {
        let Tuning {
            maze,
            enemy,
            loot,
            level,
            level_number,
            gunner,
            traps,
            trap_layout,
        } = tuning;

        let mut generation = MazeGeneration::new(maze, stream_seed(seed, RNG_STREAM_MAZE));
        let mut commands = Vec::new();
        let (layout, blueprint) = match imported {
            Some(layout) => {
                let blueprint = generation.instantiate(&layout);
                commands.push(Command::ConfigureDungeon {
                    grid: layout.grid.clone(),
                    transform: layout.transform,
                });
                generation.populate(&blueprint, &mut commands);
                (layout, blueprint)
            }
            None => generation.run(&mut commands),
        };

        commands.push(Command::PlacePlayer {
            position: layout.transform.cell_center(layout.entrance),
        });
        if let Some(door) = layout.boss_door {
            commands.push(Command::SpawnEnemy {
                position: layout.transform.cell_center(door),
                tier: EnemyTier::Boss,
            });
        }

        let traps = place_traps(
            Traps::new(traps, stream_seed(seed, RNG_STREAM_TRAPS)),
            &layout,
            &trap_layout,
        );

        let mut progress = SessionProgress::new(level.total_levels);
        progress.reset_current_score();

        let mut simulation = Self {
            world: World::new(),
            layout,
            blueprint,
            enemy_ai: EnemyAi::new(enemy, stream_seed(seed, RNG_STREAM_ENEMY_AI)),
            drops: DropSystem::new(loot, stream_seed(seed, RNG_STREAM_LOOT)),
            tracker: LevelTracker::new(level, level_number),
            progress,
            gunner: Gunner::new(gunner),
            traps,
            elapsed: Duration::ZERO,
            journal: DefaultHasher::new(),
            events_seen: 0,
        };
        simulation.dispatch(commands);
        simulation
    }

    /// Layout being played.
    pub(crate) fn layout(&self) -> &MazeLayout {
        &self.layout
    }

    /// World state, for rendering.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Advances every system by `dt`.
    pub(crate) fn step(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.dispatch(vec![Command::Tick { dt }]);
    }

    /// Steps up to `ticks` times, stopping early once the level hands back to
    /// the menu or the player dies. Returns the number of ticks run.
    pub(crate) fn run(&mut self, ticks: u64, dt: Duration) -> u64 {
        for tick in 0..ticks {
            self.step(dt);
            if self.tracker.phase() == LevelPhase::ReturnToMenu {
                info!(tick = tick + 1, "level finished, returning to menu");
                return tick + 1;
            }
            if query::player_health(&self.world).is_dead() {
                info!(tick = tick + 1, "player defeated");
                return tick + 1;
            }
        }
        ticks
    }

    /// Takes the progress notifications queued since the last call.
    pub(crate) fn drain_sync_requests(&mut self) -> Vec<SyncRequest> {
        self.progress.drain_sync_requests()
    }

    /// Digest of every event observed so far.
    pub(crate) fn fingerprint(&self) -> u64 {
        self.journal.finish()
    }

    /// Snapshot of the run for printing.
    pub(crate) fn summary(&self) -> Summary {
        let enemies = query::enemies(&self.world);
        let player = query::player_health(&self.world);
        Summary {
            ticks: query::tick_index(&self.world),
            elapsed: self.elapsed,
            walls: self.blueprint.walls.len() + self.blueprint.perimeter.len(),
            open_cells: self.blueprint.empty_cells.len(),
            enemies_alive: enemies
                .iter()
                .filter(|enemy| !enemy.health.is_dead())
                .count(),
            enemies_killed: self.tracker.kills(),
            launchers: self.traps.launchers(),
            armed_plates: self.traps.armed_plates(),
            boss_defeated: self.tracker.is_boss_defeated(),
            player_health: (player.current(), player.max()),
            coins: self.progress.currency(),
            items: self
                .progress
                .items()
                .iter()
                .map(|item| item.as_str().to_owned())
                .collect(),
            score: self.progress.current_score(),
            best_score: self.progress.best_score(),
            level: self.tracker.level(),
            phase: self.tracker.phase(),
            next_level: self.tracker.next_level(),
            events: self.events_seen,
            fingerprint: self.fingerprint(),
        }
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.settle(events);
    }

    fn settle(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            self.record(&events);

            let agents = query::agent_view(&self.world);
            let target = query::target(&self.world);
            let mut commands = Vec::new();
            self.enemy_ai
                .handle(&events, &agents, target, &self.world, &mut commands);
            self.gunner.handle(&events, &self.world, &mut commands);
            self.traps.handle(&events, target, &mut commands);
            self.drops.handle(&events, &mut commands);
            let _ = apply_rewards(&commands, &mut self.progress);
            self.tracker.handle(&events, &mut self.progress);

            events = Vec::new();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            format!("{event:?}").hash(&mut self.journal);
        }
        self.events_seen += events.len() as u64;
    }
}

/// Installs the configured traps on open cells of `layout`.
fn place_traps(mut traps: Traps, layout: &MazeLayout, placements: &TrapLayout) -> Traps {
    let open_cell = |(column, row): (u32, u32)| {
        let cell = layout
            .grid
            .clamp(i64::from(column), i64::from(row))
            .filter(|cell| layout.grid.is_open(*cell));
        if cell.is_none() {
            warn!(column, row, "trap cell is not open, skipping");
        }
        cell
    };

    for &(cell, facing) in &placements.launchers {
        if let Some(cell) = open_cell(cell) {
            let (columns, rows) = facing.offset();
            traps.add_launcher(
                layout.transform.cell_center(cell) + Vec3::Y * TORSO_HEIGHT,
                Vec3::new(columns as f32, 0.0, rows as f32),
            );
        }
    }
    for &cell in &placements.plates {
        if let Some(cell) = open_cell(cell) {
            traps.add_plate(layout.transform.cell_center(cell));
        }
    }
    traps
}

/// End-of-run report.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) elapsed: Duration,
    pub(crate) walls: usize,
    pub(crate) open_cells: usize,
    pub(crate) enemies_alive: usize,
    pub(crate) enemies_killed: u32,
    pub(crate) launchers: usize,
    pub(crate) armed_plates: usize,
    pub(crate) boss_defeated: bool,
    pub(crate) player_health: (f32, f32),
    pub(crate) coins: u64,
    pub(crate) items: Vec<String>,
    pub(crate) score: u32,
    pub(crate) best_score: u32,
    pub(crate) level: u32,
    pub(crate) phase: LevelPhase,
    pub(crate) next_level: Option<u32>,
    pub(crate) events: u64,
    pub(crate) fingerprint: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            LevelPhase::InProgress => "in progress".to_owned(),
            LevelPhase::Victory { remaining } => {
                format!("victory ({:.1}s to menu)", remaining.as_secs_f32())
            }
            LevelPhase::ReturnToMenu => "returned to menu".to_owned(),
        };
        let items = if self.items.is_empty() {
            "none".to_owned()
        } else {
            self.items.join(", ")
        };

        writeln!(
            f,
            "level {} ({phase}) after {} ticks / {:.1}s",
            self.level,
            self.ticks,
            self.elapsed.as_secs_f32()
        )?;
        writeln!(
            f,
            "dungeon: {} open cells, {} wall pieces",
            self.open_cells, self.walls
        )?;
        writeln!(
            f,
            "enemies: {} alive, {} killed, boss {}",
            self.enemies_alive,
            self.enemies_killed,
            if self.boss_defeated {
                "defeated"
            } else {
                "alive"
            }
        )?;
        if self.launchers > 0 || self.armed_plates > 0 {
            writeln!(
                f,
                "traps: {} launchers, {} plates armed",
                self.launchers, self.armed_plates
            )?;
        }
        writeln!(
            f,
            "player: {:.0}/{:.0} health",
            self.player_health.0, self.player_health.1
        )?;
        writeln!(f, "coins: {}  items: {items}", self.coins)?;
        writeln!(f, "score: {}  best: {}", self.score, self.best_score)?;
        if let Some(next) = self.next_level {
            writeln!(f, "next level: {next}")?;
        }
        write!(
            f,
            "events: {}  fingerprint: {:#018x}",
            self.events, self.fingerprint
        )
    }
}
