//! Per-enemy finite-state machine.

use std::time::Duration;

use crawler_core::{AgentSnapshot, Command, EnemyId, EnemyState, TargetSnapshot, WorldQuery};
use glam::{Quat, Vec3};
use rand::Rng;
use rand_distr::{Distribution, UnitBall};
use tracing::debug;

use crate::{Config, Profile};

/// How a patrol continues past the last waypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatrolMode {
    /// Wraps around to the first waypoint.
    Loop,
    /// Reverses and walks the path backwards.
    Bounce,
}

#[derive(Clone, Debug)]
struct Patrol {
    waypoints: Vec<Vec3>,
    mode: PatrolMode,
    index: usize,
    reversing: bool,
    waited: Duration,
}

impl Patrol {
    fn advance(&mut self) {
        let last = self.waypoints.len().saturating_sub(1);
        match self.mode {
            PatrolMode::Loop => {
                self.index = if self.index < last { self.index + 1 } else { 0 };
            }
            PatrolMode::Bounce => {
                if last == 0 {
                    return;
                }
                if self.reversing && self.index == 0 {
                    self.reversing = false;
                } else if !self.reversing && self.index >= last {
                    self.reversing = true;
                }
                self.index = if self.reversing {
                    self.index - 1
                } else {
                    self.index + 1
                };
            }
        }
    }
}

/// Behaviour state and timers of a single enemy.
#[derive(Clone, Debug)]
pub(crate) struct Brain {
    enemy: EnemyId,
    profile: Profile,
    initial: EnemyState,
    state: EnemyState,
    patrol: Option<Patrol>,
    wander_wait: Duration,
    shoot_timer: Duration,
    lose_timer: Duration,
}

impl Brain {
    pub(crate) fn new(enemy: EnemyId, profile: Profile) -> Self {
        let initial = resting_state(profile.initial_state, false);
        Self {
            enemy,
            profile,
            initial,
            state: initial,
            patrol: None,
            wander_wait: Duration::ZERO,
            shoot_timer: Duration::ZERO,
            lose_timer: Duration::ZERO,
        }
    }

    pub(crate) fn state(&self) -> EnemyState {
        self.state
    }

    /// Installs a patrol path. An empty path leaves the enemy wandering.
    pub(crate) fn assign_patrol(&mut self, waypoints: Vec<Vec3>, mode: PatrolMode) {
        let has_path = !waypoints.is_empty();
        self.patrol = has_path.then_some(Patrol {
            waypoints,
            mode,
            index: 0,
            reversing: false,
            waited: Duration::ZERO,
        });
        self.initial = resting_state(self.profile.initial_state, has_path);
        if self.state != EnemyState::Attack {
            self.state = self.initial;
        }
    }

    /// Runs one update of the state machine.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn update<Q, R>(
        &mut self,
        dt: Duration,
        agent: &AgentSnapshot,
        target: Option<&TargetSnapshot>,
        config: &Config,
        world: &Q,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        Q: WorldQuery + ?Sized,
        R: Rng + ?Sized,
    {
        let visible = target.map_or(false, |target| config.sensor.can_see(agent, target, world));

        match self.state {
            EnemyState::Patrol => {
                self.patrol_cycle(dt, agent, config, out);
                if visible {
                    self.enter_attack(out);
                }
            }
            EnemyState::Wander => {
                if visible {
                    self.enter_attack(out);
                    return;
                }
                self.wander(dt, agent, config, world, rng, out);
            }
            EnemyState::Attack => match target.filter(|_| visible) {
                Some(target) => self.track_and_shoot(dt, agent, target, config, world, rng, out),
                None => {
                    self.lose_timer += dt;
                    if self.lose_timer > config.lose_target_grace {
                        self.exit_attack(out);
                    }
                }
            },
        }
    }

    fn patrol_cycle(
        &mut self,
        dt: Duration,
        agent: &AgentSnapshot,
        config: &Config,
        out: &mut Vec<Command>,
    ) {
        let Some(patrol) = self.patrol.as_mut() else {
            return;
        };
        if agent.remaining_distance >= config.arrival_threshold {
            return;
        }

        patrol.waited += dt;
        if patrol.waited < config.patrol_dwell {
            return;
        }

        patrol.advance();
        patrol.waited = Duration::ZERO;
        if let Some(destination) = patrol.waypoints.get(patrol.index).copied() {
            out.push(Command::MoveAgent {
                enemy: self.enemy,
                destination,
            });
        }
    }

    fn wander<Q, R>(
        &mut self,
        dt: Duration,
        agent: &AgentSnapshot,
        config: &Config,
        world: &Q,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        Q: WorldQuery + ?Sized,
        R: Rng + ?Sized,
    {
        if !agent.on_navigable {
            return;
        }
        if agent.has_path && agent.remaining_distance >= config.arrival_threshold {
            return;
        }

        self.wander_wait += dt;
        if self.wander_wait <= config.wander_dwell {
            return;
        }
        self.wander_wait = Duration::ZERO;

        let [x, y, z]: [f32; 3] = UnitBall.sample(rng);
        let candidate = agent.position + Vec3::new(x, y, z) * config.wander_radius;
        if let Some(destination) = world.sample_navigable(candidate, config.wander_radius) {
            out.push(Command::MoveAgent {
                enemy: self.enemy,
                destination,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn track_and_shoot<Q, R>(
        &mut self,
        dt: Duration,
        agent: &AgentSnapshot,
        target: &TargetSnapshot,
        config: &Config,
        world: &Q,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        Q: WorldQuery + ?Sized,
        R: Rng + ?Sized,
    {
        self.lose_timer = Duration::ZERO;

        let look = target.position - agent.position;
        let look = Vec3::new(look.x, 0.0, look.z);
        if look.length_squared() > f32::EPSILON {
            let blend = (dt.as_secs_f32() * config.turn_rate).clamp(0.0, 1.0);
            let forward = yaw_rotation(agent.forward).slerp(yaw_rotation(look), blend) * Vec3::Z;
            out.push(Command::TurnAgent {
                enemy: self.enemy,
                forward,
            });
        }

        self.shoot_timer += dt;
        if self.shoot_timer > config.fire_rate {
            let origin = agent.position
                + Vec3::Y * config.muzzle_height
                + agent.forward * config.muzzle_forward_offset;
            self.profile.weapon.fire(origin, target, world, rng, out);
            self.shoot_timer = Duration::ZERO;
        }
    }

    fn enter_attack(&mut self, out: &mut Vec<Command>) {
        debug!(enemy = self.enemy.get(), from = ?self.state, "target sighted");
        self.state = EnemyState::Attack;
        self.shoot_timer = Duration::ZERO;
        self.lose_timer = Duration::ZERO;
        out.push(Command::HaltAgent {
            enemy: self.enemy,
            halted: true,
        });
    }

    fn exit_attack(&mut self, out: &mut Vec<Command>) {
        debug!(enemy = self.enemy.get(), to = ?self.initial, "target lost");
        self.state = self.initial;
        self.wander_wait = Duration::ZERO;
        out.push(Command::HaltAgent {
            enemy: self.enemy,
            halted: false,
        });
    }
}

/// Patrolling needs a path; without one the enemy wanders.
fn resting_state(preferred: EnemyState, has_path: bool) -> EnemyState {
    match preferred {
        EnemyState::Patrol if has_path => EnemyState::Patrol,
        _ => EnemyState::Wander,
    }
}

/// Rotation about +Y that turns +Z onto the horizontal `forward`.
fn yaw_rotation(forward: Vec3) -> Quat {
    Quat::from_rotation_y(forward.x.atan2(forward.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_patrol_wraps_to_start() {
        let mut patrol = Patrol {
            waypoints: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            mode: PatrolMode::Loop,
            index: 0,
            reversing: false,
            waited: Duration::ZERO,
        };
        let visited: Vec<usize> = (0..4)
            .map(|_| {
                patrol.advance();
                patrol.index
            })
            .collect();
        assert_eq!(visited, vec![1, 2, 0, 1]);
    }

    #[test]
    fn bounce_patrol_reverses_at_both_ends() {
        let mut patrol = Patrol {
            waypoints: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            mode: PatrolMode::Bounce,
            index: 0,
            reversing: false,
            waited: Duration::ZERO,
        };
        let visited: Vec<usize> = (0..6)
            .map(|_| {
                patrol.advance();
                patrol.index
            })
            .collect();
        assert_eq!(visited, vec![1, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn yaw_rotation_maps_forward_axis() {
        let rotated = yaw_rotation(Vec3::X) * Vec3::Z;
        assert!((rotated - Vec3::X).length() < 1e-5);
    }
}
