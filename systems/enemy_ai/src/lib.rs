#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy behaviour: a Patrol/Wander/Attack state machine per enemy driven by
//! a line-of-sight sensor.

use std::{collections::BTreeMap, time::Duration};

use crawler_core::{
    AgentView, Command, EnemyId, EnemyState, EnemyTier, Event, TargetSnapshot, WorldQuery,
};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

mod brain;
mod sensor;
mod weapon;

use brain::Brain;

pub use brain::PatrolMode;
pub use sensor::Sensor;
pub use weapon::{Damage, Weapon};

/// Behaviour variant assigned to an enemy tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Profile {
    /// State entered on spawn and after losing the target. `Patrol` falls back
    /// to `Wander` until a patrol path is assigned.
    pub initial_state: EnemyState,
    /// Weapon fired while attacking.
    pub weapon: Weapon,
}

/// Tuning knobs shared by every enemy brain.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Vision used to detect the target.
    pub sensor: Sensor,
    /// Minimum time between two shots.
    pub fire_rate: Duration,
    /// Angular interpolation factor per second while turning toward the target.
    pub turn_rate: f32,
    /// Time the target must stay out of sight before the attack is abandoned.
    pub lose_target_grace: Duration,
    /// Height above the pivot that shots leave from.
    pub muzzle_height: f32,
    /// Distance in front of the pivot that shots leave from.
    pub muzzle_forward_offset: f32,
    /// Remaining path distance under which a destination counts as reached.
    pub arrival_threshold: f32,
    /// Time spent at each patrol waypoint.
    pub patrol_dwell: Duration,
    /// Idle time before a new wander destination is picked.
    pub wander_dwell: Duration,
    /// Radius around the enemy that wander destinations are drawn from.
    pub wander_radius: f32,
    /// Variant used by regular enemies.
    pub regular: Profile,
    /// Variant used by bosses.
    pub boss: Profile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor: Sensor::default(),
            fire_rate: Duration::from_secs(1),
            turn_rate: 5.0,
            lose_target_grace: Duration::from_secs(2),
            muzzle_height: 1.5,
            muzzle_forward_offset: 0.6,
            arrival_threshold: 0.2,
            patrol_dwell: Duration::from_secs(3),
            wander_dwell: Duration::from_secs(1),
            wander_radius: 10.0,
            regular: Profile {
                initial_state: EnemyState::Wander,
                weapon: Weapon::rifle(),
            },
            boss: Profile {
                initial_state: EnemyState::Wander,
                weapon: Weapon::launcher(),
            },
        }
    }
}

impl Config {
    fn profile(&self, tier: EnemyTier) -> Profile {
        match tier {
            EnemyTier::Regular => self.regular,
            EnemyTier::Boss => self.boss,
        }
    }
}

/// Pure system that drives every enemy's state machine.
#[derive(Debug)]
pub struct EnemyAi {
    config: Config,
    brains: BTreeMap<EnemyId, Brain>,
    rng: ChaCha8Rng,
}

impl EnemyAi {
    /// Creates the system; every random draw derives from `seed`.
    #[must_use]
    pub fn new(config: Config, seed: u64) -> Self {
        Self {
            config,
            brains: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current state of an enemy, or `None` when it is dead or unknown.
    #[must_use]
    pub fn state_of(&self, enemy: EnemyId) -> Option<EnemyState> {
        self.brains.get(&enemy).map(|brain| brain.state())
    }

    /// Number of enemies being driven.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.brains.len()
    }

    /// Gives an enemy a fixed waypoint path. Ignored for unknown enemies.
    pub fn assign_patrol(&mut self, enemy: EnemyId, waypoints: Vec<Vec3>, mode: PatrolMode) {
        if let Some(brain) = self.brains.get_mut(&enemy) {
            brain.assign_patrol(waypoints, mode);
        }
    }

    /// Consumes world events and emits movement, turning and shooting commands.
    ///
    /// Spawns register a brain using the tier's profile and deaths retire it.
    /// Every `TimeAdvanced` event updates each brain whose agent appears in
    /// `agents`, in identifier order.
    pub fn handle<Q>(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        target: Option<TargetSnapshot>,
        world: &Q,
        out: &mut Vec<Command>,
    ) where
        Q: WorldQuery + ?Sized,
    {
        for event in events {
            match event {
                Event::DungeonConfigured { .. } => self.brains.clear(),
                Event::EnemySpawned { enemy, tier, .. } => {
                    let brain = Brain::new(*enemy, self.config.profile(*tier));
                    debug!(enemy = enemy.get(), state = ?brain.state(), "brain attached");
                    let _ = self.brains.insert(*enemy, brain);
                }
                Event::EnemyDied { enemy, .. } => {
                    let _ = self.brains.remove(enemy);
                }
                Event::TimeAdvanced { dt } => {
                    for (enemy, brain) in self.brains.iter_mut() {
                        let Some(agent) = agents.get(*enemy) else {
                            continue;
                        };
                        brain.update(
                            *dt,
                            agent,
                            target.as_ref(),
                            &self.config,
                            world,
                            &mut self.rng,
                            out,
                        );
                    }
                }
                _ => {}
            }
        }
    }
}
