#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the dungeon crawler simulation.

mod enemies;
mod navigation;
mod physics;

use std::{collections::BTreeMap, time::Duration};

use crawler_core::{
    Collider, Command, DamageOutcome, DamageTarget, EnemyId, EnemyTier, Event, GridTransform,
    Health, MazeGrid, ProjectileId, RayHit, WorldQuery,
};
use glam::Vec3;
use tracing::{debug, info};

use enemies::EnemyRegistry;
use navigation::NavigationSurface;
use physics::Body;

/// Maximum health of a regular enemy.
pub const REGULAR_ENEMY_HEALTH: f32 = 50.0;
/// Maximum health of a boss.
pub const BOSS_ENEMY_HEALTH: f32 = 250.0;
/// Maximum health of the player target.
pub const PLAYER_HEALTH: f32 = 100.0;
/// Walking speed of enemy navigation agents, in world units per second.
pub const AGENT_SPEED: f32 = 3.5;
/// Delay between an enemy's death and its removal from the world.
pub const DESPAWN_DELAY: Duration = Duration::from_millis(500);

const BODY_RADIUS: f32 = 0.5;
const BODY_HEIGHT: f32 = 2.0;
const DEFAULT_CELL_SIZE: f32 = 2.0;

/// Represents the authoritative dungeon world state.
#[derive(Debug)]
pub struct World {
    grid: MazeGrid,
    transform: GridTransform,
    navigation: Option<NavigationSurface>,
    player: Player,
    enemies: EnemyRegistry,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with no layout, enemies or player placement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: MazeGrid::new(0, 0),
            transform: GridTransform::new(Vec3::ZERO, DEFAULT_CELL_SIZE, 0, 0),
            navigation: None,
            player: Player::new(),
            enemies: EnemyRegistry::new(),
            projectiles: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
            tick_index: 0,
        }
    }

    fn bodies(&self) -> Vec<Body> {
        let player = self.player.position.map(|base| Body {
            collider: Collider::Player,
            base,
            radius: BODY_RADIUS,
            height: BODY_HEIGHT,
        });
        player
            .into_iter()
            .chain(self.enemies.iter().map(|(id, enemy)| Body {
                collider: Collider::Enemy(id),
                base: enemy.agent.position,
                radius: BODY_RADIUS,
                height: BODY_HEIGHT,
            }))
            .collect()
    }

    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        physics::cast(
            &self.grid,
            &self.transform,
            &self.bodies(),
            origin,
            direction,
            max_distance,
        )
    }

    fn damage_enemy(&mut self, enemy: EnemyId, amount: f32, out_events: &mut Vec<Event>) {
        let Some(entity) = self.enemies.get_mut(enemy) else {
            return;
        };

        let outcome = entity.health.apply_damage(amount);
        if outcome == DamageOutcome::AlreadyDead {
            return;
        }

        out_events.push(Event::EnemyHealthChanged {
            enemy,
            current: entity.health.current(),
            max: entity.health.max(),
        });

        if outcome == DamageOutcome::Died {
            entity.despawn_in = Some(DESPAWN_DELAY);
            entity.agent.waypoints.clear();
            entity.agent.halted = true;
            info!(enemy = enemy.get(), tier = ?entity.tier, "enemy died");
            out_events.push(Event::EnemyDied {
                enemy,
                tier: entity.tier,
                position: entity.agent.position,
            });
        }
    }

    fn damage_player(&mut self, amount: f32, out_events: &mut Vec<Event>) {
        if self.player.health.apply_damage(amount) == DamageOutcome::AlreadyDead {
            return;
        }
        out_events.push(Event::PlayerDamaged {
            amount,
            current: self.player.health.current(),
            max: self.player.health.max(),
        });
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let ids: Vec<ProjectileId> = self.projectiles.keys().copied().collect();
        for id in ids {
            let Some(projectile) = self.projectiles.get(&id).copied() else {
                continue;
            };

            let travel = projectile.velocity.length() * dt.as_secs_f32();
            let impact = self
                .cast(projectile.position, projectile.velocity, travel)
                .map(|hit| hit.collider);

            if let Some(collider) = impact {
                let _ = self.projectiles.remove(&id);
                out_events.push(Event::ProjectileExpired {
                    projectile: id,
                    impact: Some(collider),
                });
                if collider == Collider::Player {
                    self.damage_player(projectile.damage, out_events);
                }
                continue;
            }

            let remaining = projectile.remaining.saturating_sub(dt);
            if remaining.is_zero() {
                let _ = self.projectiles.remove(&id);
                out_events.push(Event::ProjectileExpired {
                    projectile: id,
                    impact: None,
                });
                continue;
            }

            if let Some(stored) = self.projectiles.get_mut(&id) {
                stored.position += projectile.velocity * dt.as_secs_f32();
                stored.remaining = remaining;
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldQuery for World {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.cast(origin, direction, max_distance)
    }

    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        self.navigation
            .as_ref()
            .and_then(|surface| surface.sample(point, radius))
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    position: Option<Vec3>,
    health: Health,
}

impl Player {
    fn new() -> Self {
        Self {
            position: None,
            health: Health::new(PLAYER_HEALTH),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    position: Vec3,
    velocity: Vec3,
    damage: f32,
    remaining: Duration,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureDungeon { grid, transform } => {
            out_events.push(Event::DungeonConfigured {
                columns: grid.columns(),
                rows: grid.rows(),
            });
            world.grid = grid;
            world.transform = transform;
            world.navigation = None;
            world.enemies = EnemyRegistry::new();
            world.projectiles.clear();
            world.player.position = None;
        }
        Command::RebuildNavigation => {
            let surface = NavigationSurface::build(&world.grid, world.transform);
            let navigable_cells = surface.navigable_cells();
            debug!(navigable_cells, "navigation rebuilt");
            world.navigation = Some(surface);
            out_events.push(Event::NavigationRebuilt { navigable_cells });
        }
        Command::PlacePlayer { position } => {
            world.player.position = Some(position);
            out_events.push(Event::PlayerPlaced { position });
        }
        Command::SpawnEnemy { position, tier } => {
            let max_health = match tier {
                EnemyTier::Regular => REGULAR_ENEMY_HEALTH,
                EnemyTier::Boss => BOSS_ENEMY_HEALTH,
            };
            let enemy = world.enemies.insert(tier, max_health, position);
            out_events.push(Event::EnemySpawned {
                enemy,
                tier,
                position,
            });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            for (_, enemy) in world.enemies.iter_mut() {
                if enemy.is_alive() {
                    enemy.agent.advance(dt, AGENT_SPEED);
                }
            }

            world.advance_projectiles(dt, out_events);

            for enemy in world.enemies.expire(dt) {
                debug!(enemy = enemy.get(), "enemy despawned");
                out_events.push(Event::EnemyDespawned { enemy });
            }
        }
        Command::MoveAgent { enemy, destination } => {
            let Some(surface) = world.navigation.as_ref() else {
                return;
            };
            let Some(entity) = world.enemies.living_mut(enemy) else {
                return;
            };
            match surface.route(entity.agent.position, destination) {
                Some(waypoints) => entity.agent.waypoints = waypoints.into(),
                None => debug!(enemy = enemy.get(), ?destination, "destination unreachable"),
            }
        }
        Command::HaltAgent { enemy, halted } => {
            if let Some(entity) = world.enemies.living_mut(enemy) {
                entity.agent.halted = halted;
            }
        }
        Command::TurnAgent { enemy, forward } => {
            let forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
            if forward == Vec3::ZERO {
                return;
            }
            if let Some(entity) = world.enemies.living_mut(enemy) {
                entity.agent.forward = forward;
            }
        }
        Command::ApplyDamage { target, amount } => match target {
            DamageTarget::Player => world.damage_player(amount, out_events),
            DamageTarget::Enemy(enemy) => world.damage_enemy(enemy, amount, out_events),
        },
        Command::SpawnProjectile {
            origin,
            velocity,
            damage,
            lifetime,
        } => {
            let projectile = world.next_projectile_id;
            world.next_projectile_id = ProjectileId::new(projectile.get().saturating_add(1));
            let _ = world.projectiles.insert(
                projectile,
                Projectile {
                    position: origin,
                    velocity,
                    damage,
                    remaining: lifetime,
                },
            );
            out_events.push(Event::ProjectileLaunched { projectile });
        }
        Command::AwardCurrency { .. } | Command::AwardItem { .. } => {}
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use crawler_core::{
        AgentSnapshot, AgentView, EnemyId, EnemyTier, GridTransform, Health, MazeGrid,
        TargetSnapshot,
    };
    use glam::Vec3;

    use super::World;

    /// Provides read-only access to the active layout.
    #[must_use]
    pub fn grid(world: &World) -> &MazeGrid {
        &world.grid
    }

    /// Provides read-only access to the placement of the active layout.
    #[must_use]
    pub fn transform(world: &World) -> &GridTransform {
        &world.transform
    }

    /// Reports whether a navigable surface covers the active layout.
    #[must_use]
    pub fn navigation_ready(world: &World) -> bool {
        world.navigation.is_some()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures the agents of every living enemy.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let snapshots = world
            .enemies
            .iter()
            .filter(|(_, enemy)| enemy.is_alive())
            .map(|(id, enemy)| AgentSnapshot {
                enemy: id,
                position: enemy.agent.position,
                forward: enemy.agent.forward,
                on_navigable: world
                    .navigation
                    .as_ref()
                    .map_or(false, |surface| surface.contains(enemy.agent.position)),
                has_path: !enemy.agent.waypoints.is_empty(),
                remaining_distance: enemy.agent.remaining_distance(),
                halted: enemy.agent.halted,
            })
            .collect();
        AgentView::from_snapshots(snapshots)
    }

    /// Target hunted by enemies, present while the player is placed and alive.
    #[must_use]
    pub fn target(world: &World) -> Option<TargetSnapshot> {
        if world.player.health.is_dead() {
            return None;
        }
        world
            .player
            .position
            .map(|position| TargetSnapshot { position })
    }

    /// Health of the player target.
    #[must_use]
    pub fn player_health(world: &World) -> &Health {
        &world.player.health
    }

    /// Captures every enemy still present in the world, dead or alive.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|(id, enemy)| EnemySnapshot {
                id,
                tier: enemy.tier,
                position: enemy.agent.position,
                health: enemy.health,
            })
            .collect()
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(id).map(|enemy| EnemySnapshot {
            id,
            tier: enemy.tier,
            position: enemy.agent.position,
            health: enemy.health,
        })
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier assigned to the enemy.
        pub id: EnemyId,
        /// Reward tier of the enemy.
        pub tier: EnemyTier,
        /// World-space pivot position.
        pub position: Vec3,
        /// Health pool, including the death latch.
        pub health: Health,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::CellCoord;

    fn corridor_world() -> (World, Vec<Event>) {
        let mut grid = MazeGrid::new(6, 1);
        for column in 0..5 {
            grid.open(CellCoord::new(column, 0));
        }
        let transform = GridTransform::new(Vec3::new(6.0, 0.0, 1.0), 2.0, 6, 1);
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureDungeon { grid, transform },
            &mut events,
        );
        apply(&mut world, Command::RebuildNavigation, &mut events);
        (world, events)
    }

    fn spawn(world: &mut World, x: f32, tier: EnemyTier) -> EnemyId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                position: Vec3::new(x, 0.0, 1.0),
                tier,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn configure_and_rebuild_report_dimensions() {
        let (world, events) = corridor_world();
        assert_eq!(
            events,
            vec![
                Event::DungeonConfigured { columns: 6, rows: 1 },
                Event::NavigationRebuilt { navigable_cells: 5 },
            ]
        );
        assert!(query::navigation_ready(&world));
    }

    #[test]
    fn lethal_damage_fires_death_once_then_despawns() {
        let (mut world, _) = corridor_world();
        let enemy = spawn(&mut world, 3.0, EnemyTier::Regular);
        let mut events = Vec::new();

        for _ in 0..2 {
            apply(
                &mut world,
                Command::ApplyDamage {
                    target: DamageTarget::Enemy(enemy),
                    amount: REGULAR_ENEMY_HEALTH,
                },
                &mut events,
            );
        }

        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert!(query::agent_view(&world).is_empty());

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        assert!(query::enemy(&world, enemy).is_some());
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(250),
            },
            &mut events,
        );
        assert!(events.contains(&Event::EnemyDespawned { enemy }));
        assert!(query::enemy(&world, enemy).is_none());
    }

    #[test]
    fn partial_damage_reports_health_bar_fill() {
        let (mut world, _) = corridor_world();
        let enemy = spawn(&mut world, 3.0, EnemyTier::Boss);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ApplyDamage {
                target: DamageTarget::Enemy(enemy),
                amount: 50.0,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::EnemyHealthChanged {
                enemy,
                current: BOSS_ENEMY_HEALTH - 50.0,
                max: BOSS_ENEMY_HEALTH,
            }]
        );
    }

    #[test]
    fn agents_walk_to_destinations_and_stop_when_halted() {
        let (mut world, _) = corridor_world();
        let enemy = spawn(&mut world, 1.0, EnemyTier::Regular);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveAgent {
                enemy,
                destination: Vec3::new(9.0, 0.0, 1.0),
            },
            &mut events,
        );

        let agent = *query::agent_view(&world).get(enemy).expect("agent");
        assert!(agent.has_path);
        assert!((agent.remaining_distance - 8.0).abs() < 1e-4);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        let agent = *query::agent_view(&world).get(enemy).expect("agent");
        assert!((agent.position.x - (1.0 + AGENT_SPEED)).abs() < 1e-4);
        assert_eq!(agent.forward, Vec3::X);

        apply(
            &mut world,
            Command::HaltAgent {
                enemy,
                halted: true,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        let halted = *query::agent_view(&world).get(enemy).expect("agent");
        assert_eq!(halted.position, agent.position);
        assert!(halted.halted);
    }

    #[test]
    fn raycast_hits_player_before_wall() {
        let (mut world, _) = corridor_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlacePlayer {
                position: Vec3::new(7.0, 0.0, 1.0),
            },
            &mut events,
        );
        let hit = world
            .raycast(Vec3::new(1.0, 1.0, 1.0), Vec3::X, 20.0)
            .expect("hit");
        assert_eq!(hit.collider, Collider::Player);

        let beyond = world
            .raycast(Vec3::new(1.0, 1.0, 1.0), Vec3::NEG_X, 20.0)
            .expect("perimeter");
        assert_eq!(beyond.collider, Collider::Wall);
    }

    #[test]
    fn vertical_raycast_without_reach_limit_returns() {
        let (world, _) = corridor_world();
        assert!(world
            .raycast(Vec3::new(1.0, 1.0, 1.0), Vec3::Y, f32::INFINITY)
            .is_none());
        assert!(world
            .raycast(Vec3::new(1.0, 1.0, 1.0), Vec3::NEG_Y, f32::NAN)
            .is_none());
    }

    #[test]
    fn projectile_damages_player_on_impact() {
        let (mut world, _) = corridor_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlacePlayer {
                position: Vec3::new(7.0, 0.0, 1.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnProjectile {
                origin: Vec3::new(1.0, 1.0, 1.0),
                velocity: Vec3::new(15.0, 0.0, 0.0),
                damage: 12.0,
                lifetime: Duration::from_secs(3),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );
        assert!(events.contains(&Event::ProjectileExpired {
            projectile: ProjectileId::new(0),
            impact: Some(Collider::Player),
        }));
        assert_eq!(query::player_health(&world).current(), PLAYER_HEALTH - 12.0);
        assert_eq!(query::projectile_count(&world), 0);
    }

    #[test]
    fn projectile_expires_after_lifetime() {
        let (mut world, _) = corridor_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnProjectile {
                origin: Vec3::new(1.0, 1.0, 1.0),
                velocity: Vec3::new(0.0, 1.0, 0.0),
                damage: 12.0,
                lifetime: Duration::from_millis(100),
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        assert!(events.contains(&Event::ProjectileExpired {
            projectile: ProjectileId::new(0),
            impact: None,
        }));
    }

    #[test]
    fn sampling_requires_navigation() {
        let mut world = World::new();
        assert!(world.sample_navigable(Vec3::ZERO, 10.0).is_none());

        let (built, _) = corridor_world();
        world = built;
        assert!(world
            .sample_navigable(Vec3::new(3.0, 0.0, 1.0), 1.0)
            .is_some());
    }
}
