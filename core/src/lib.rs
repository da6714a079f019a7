#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the dungeon crawler simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots through [`WorldQuery`] and [`AgentView`], and respond exclusively
//! with new command batches.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod grid;
mod health;

pub use grid::{Cell, CellCoord, Direction, GridTransform, MazeGrid};
pub use health::{DamageOutcome, Health};

/// Label of the random stream consumed by maze generation.
pub const RNG_STREAM_MAZE: &str = "maze";
/// Label of the random stream consumed by enemy behaviour.
pub const RNG_STREAM_ENEMY_AI: &str = "enemy-ai";
/// Label of the random stream consumed by reward sampling.
pub const RNG_STREAM_LOOT: &str = "loot";
/// Label of the random stream consumed by trap damage rolls.
pub const RNG_STREAM_TRAPS: &str = "traps";

/// Height above an actor's pivot that line-of-sight and shots aim at.
pub const TORSO_HEIGHT: f32 = 1.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the dungeon layout. Clears enemies, projectiles and navigation.
    ConfigureDungeon {
        /// Cell layout produced by maze generation.
        grid: MazeGrid,
        /// Placement of the grid in world space.
        transform: GridTransform,
    },
    /// Rebuilds the navigable surface over the current layout.
    RebuildNavigation,
    /// Moves the player target to the provided position.
    PlacePlayer {
        /// World-space position of the player pivot.
        position: Vec3,
    },
    /// Creates an enemy entity at the provided position.
    SpawnEnemy {
        /// World-space spawn position.
        position: Vec3,
        /// Reward tier assigned to the enemy.
        tier: EnemyTier,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Sets the movement destination of an enemy's navigation agent.
    MoveAgent {
        /// Enemy owning the agent.
        enemy: EnemyId,
        /// Desired destination on the navigable surface.
        destination: Vec3,
    },
    /// Stops or resumes an enemy's navigation agent.
    HaltAgent {
        /// Enemy owning the agent.
        enemy: EnemyId,
        /// Whether the agent should hold position.
        halted: bool,
    },
    /// Rotates an enemy to face a new horizontal direction.
    TurnAgent {
        /// Enemy to rotate.
        enemy: EnemyId,
        /// New facing direction.
        forward: Vec3,
    },
    /// Subtracts health from an actor.
    ApplyDamage {
        /// Actor receiving the damage.
        target: DamageTarget,
        /// Amount of health removed.
        amount: f32,
    },
    /// Launches a projectile that damages whatever it collides with first.
    SpawnProjectile {
        /// World-space launch position.
        origin: Vec3,
        /// Velocity in world units per second.
        velocity: Vec3,
        /// Damage applied to the player on impact.
        damage: f32,
        /// Time after which the projectile expires without impact.
        lifetime: Duration,
    },
    /// Best-effort notification that currency was earned.
    AwardCurrency {
        /// Amount of currency earned.
        amount: u32,
    },
    /// Best-effort notification that an item was earned.
    AwardItem {
        /// Identifier of the earned item.
        item: ItemId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a new dungeon layout is active.
    DungeonConfigured {
        /// Number of grid columns.
        columns: u32,
        /// Number of grid rows.
        rows: u32,
    },
    /// Confirms that the navigable surface covers the current layout.
    NavigationRebuilt {
        /// Number of open cells that agents may traverse.
        navigable_cells: usize,
    },
    /// Confirms that the player target moved.
    PlayerPlaced {
        /// New player position.
        position: Vec3,
    },
    /// Confirms that an enemy entered the world.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Reward tier of the enemy.
        tier: EnemyTier,
        /// World-space spawn position.
        position: Vec3,
    },
    /// Reports an enemy's health after damage, for health-bar displays.
    EnemyHealthChanged {
        /// Damaged enemy.
        enemy: EnemyId,
        /// Remaining health.
        current: f32,
        /// Maximum health.
        max: f32,
    },
    /// One-shot notification that an enemy's health reached zero.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Reward tier of the enemy.
        tier: EnemyTier,
        /// Position at the time of death.
        position: Vec3,
    },
    /// Confirms that a dead enemy was removed after its despawn delay.
    EnemyDespawned {
        /// Enemy that was removed.
        enemy: EnemyId,
    },
    /// Reports damage received by the player.
    PlayerDamaged {
        /// Damage applied.
        amount: f32,
        /// Remaining player health.
        current: f32,
        /// Maximum player health.
        max: f32,
    },
    /// Confirms that a projectile entered the world.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
    },
    /// Confirms that a projectile left the world.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
        /// Collider struck, or `None` when the lifetime ran out.
        impact: Option<Collider>,
    },
}

/// Reward tier of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyTier {
    /// Ordinary maze inhabitant.
    Regular,
    /// Boss guarding the exit; drops items.
    Boss,
}

/// Behaviour state of an enemy's finite-state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Following a fixed waypoint path.
    Patrol,
    /// Roaming between randomly sampled reachable points.
    Wander,
    /// Tracking and shooting at a sighted target.
    Attack,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Catalogue identifier of an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an item identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the textual identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a prefab an adapter instantiates for geometry or actors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefabId(String);

impl PrefabId {
    /// Creates a prefab identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the textual identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Actor that can receive damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageTarget {
    /// The player target.
    Player,
    /// An enemy.
    Enemy(EnemyId),
}

/// Collision volume struck by a ray or projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collider {
    /// The player's body.
    Player,
    /// An enemy's body.
    Enemy(EnemyId),
    /// A wall cell or perimeter segment.
    Wall,
}

impl Collider {
    /// Damage target corresponding to the collider, if it can take damage.
    #[must_use]
    pub const fn damage_target(self) -> Option<DamageTarget> {
        match self {
            Collider::Player => Some(DamageTarget::Player),
            Collider::Enemy(enemy) => Some(DamageTarget::Enemy(enemy)),
            Collider::Wall => None,
        }
    }
}

/// First intersection reported by [`WorldQuery::raycast`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Collider that was struck.
    pub collider: Collider,
    /// World-space intersection point.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Narrow read-only interface over physics and navigation queries.
pub trait WorldQuery {
    /// Casts a ray and reports the first collider hit within `max_distance`.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Snaps `point` onto the navigable surface within `radius`.
    fn sample_navigable(&self, point: Vec3, radius: f32) -> Option<Vec3>;
}

/// Receiver of best-effort reward notifications.
pub trait RewardSink {
    /// Records earned currency.
    fn add_currency(&mut self, amount: u32);

    /// Records an earned item.
    fn add_item(&mut self, item: ItemId);
}

/// Receiver of score and level-completion notifications.
pub trait ProgressSink {
    /// Adds points to the current run.
    fn add_score(&mut self, points: u32);

    /// Score accumulated during the current run.
    fn current_score(&self) -> u32;

    /// Records that `level` was completed with `score`.
    fn record_level_completed(&mut self, level: u32, score: u32);
}

/// Read-only snapshot of an enemy's navigation agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Enemy owning the agent.
    pub enemy: EnemyId,
    /// World-space pivot position.
    pub position: Vec3,
    /// Normalised horizontal facing.
    pub forward: Vec3,
    /// Whether the agent currently stands on the navigable surface.
    pub on_navigable: bool,
    /// Whether the agent has an active path.
    pub has_path: bool,
    /// Remaining distance along the active path; zero when idle.
    pub remaining_distance: f32,
    /// Whether the agent is holding position.
    pub halted: bool,
}

/// Read-only snapshot describing all living enemy agents.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a view from snapshots, ordering them by enemy identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.enemy);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for a specific enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.enemy)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read-only snapshot of the target enemies hunt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    /// World-space pivot position of the target.
    pub position: Vec3,
}

impl TargetSnapshot {
    /// Point at torso height that sensors and shots aim at.
    #[must_use]
    pub fn torso(&self) -> Vec3 {
        self.position + Vec3::Y * TORSO_HEIGHT
    }
}

/// Derives an independent seed for a named random stream from a master seed.
#[must_use]
pub fn stream_seed(master: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn maze_grid_round_trips_through_bincode() {
        let mut grid = MazeGrid::new(3, 2);
        grid.open(CellCoord::new(1, 1));
        assert_round_trip(&grid);
    }

    #[test]
    fn item_id_round_trips_through_bincode() {
        assert_round_trip(&ItemId::new("obj01"));
    }

    #[test]
    fn stream_seeds_are_label_dependent() {
        assert_ne!(
            stream_seed(7, RNG_STREAM_MAZE),
            stream_seed(7, RNG_STREAM_LOOT)
        );
        assert_eq!(stream_seed(7, RNG_STREAM_MAZE), stream_seed(7, RNG_STREAM_MAZE));
    }

    #[test]
    fn agent_view_lookup_uses_identifier_order() {
        let snapshot = |id| AgentSnapshot {
            enemy: EnemyId::new(id),
            position: Vec3::ZERO,
            forward: Vec3::Z,
            on_navigable: true,
            has_path: false,
            remaining_distance: 0.0,
            halted: false,
        };
        let view = AgentView::from_snapshots(vec![snapshot(9), snapshot(2), snapshot(5)]);
        let order: Vec<u32> = view.iter().map(|agent| agent.enemy.get()).collect();
        assert_eq!(order, vec![2, 5, 9]);
        assert!(view.get(EnemyId::new(5)).is_some());
        assert!(view.get(EnemyId::new(4)).is_none());
    }

    #[test]
    fn walls_cannot_be_damaged() {
        assert_eq!(Collider::Wall.damage_target(), None);
        assert_eq!(
            Collider::Enemy(EnemyId::new(3)).damage_target(),
            Some(DamageTarget::Enemy(EnemyId::new(3)))
        );
    }
}
