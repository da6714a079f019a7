//! Authoritative enemy state: health, navigation agents and despawn timers.

use std::{collections::BTreeMap, collections::VecDeque, time::Duration};

use crawler_core::{EnemyId, EnemyTier, Health};
use glam::Vec3;

/// Movement state of an enemy's navigation agent.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) position: Vec3,
    pub(crate) forward: Vec3,
    pub(crate) waypoints: VecDeque<Vec3>,
    pub(crate) halted: bool,
}

impl Agent {
    fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            waypoints: VecDeque::new(),
            halted: false,
        }
    }

    /// Distance left along the active path; zero when idle.
    pub(crate) fn remaining_distance(&self) -> f32 {
        let mut previous = self.position;
        let mut total = 0.0;
        for waypoint in &self.waypoints {
            total += previous.distance(*waypoint);
            previous = *waypoint;
        }
        total
    }

    /// Walks along the waypoints for `dt` at `speed`, facing the direction of travel.
    pub(crate) fn advance(&mut self, dt: Duration, speed: f32) {
        if self.halted {
            return;
        }

        let mut budget = speed * dt.as_secs_f32();
        while budget > 0.0 {
            let Some(waypoint) = self.waypoints.front().copied() else {
                break;
            };
            let offset = waypoint - self.position;
            let heading = Vec3::new(offset.x, 0.0, offset.z).normalize_or_zero();
            if heading != Vec3::ZERO {
                self.forward = heading;
            }

            let distance = offset.length();
            if distance <= budget {
                self.position = waypoint;
                budget -= distance;
                let _ = self.waypoints.pop_front();
            } else {
                self.position += offset / distance * budget;
                budget = 0.0;
            }
        }
    }
}

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EnemyEntity {
    pub(crate) tier: EnemyTier,
    pub(crate) health: Health,
    pub(crate) agent: Agent,
    pub(crate) despawn_in: Option<Duration>,
}

impl EnemyEntity {
    pub(crate) fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }
}

/// Registry that stores enemies and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, EnemyEntity>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Stores a new enemy with full health and returns its identifier.
    pub(crate) fn insert(&mut self, tier: EnemyTier, max_health: f32, position: Vec3) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            EnemyEntity {
                tier,
                health: Health::new(max_health),
                agent: Agent::new(position),
                despawn_in: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&EnemyEntity> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut EnemyEntity> {
        self.entries.get_mut(&id)
    }

    /// Living enemies whose agent accepts movement commands.
    pub(crate) fn living_mut(&mut self, id: EnemyId) -> Option<&mut EnemyEntity> {
        self.entries.get_mut(&id).filter(|enemy| enemy.is_alive())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemyId, &EnemyEntity)> {
        self.entries.iter().map(|(id, enemy)| (*id, enemy))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (EnemyId, &mut EnemyEntity)> {
        self.entries.iter_mut().map(|(id, enemy)| (*id, enemy))
    }

    /// Counts down despawn timers and removes the enemies whose delay elapsed.
    pub(crate) fn expire(&mut self, dt: Duration) -> Vec<EnemyId> {
        let mut expired = Vec::new();
        for (id, enemy) in self.entries.iter_mut() {
            if let Some(remaining) = enemy.despawn_in {
                let remaining = remaining.saturating_sub(dt);
                enemy.despawn_in = Some(remaining);
                if remaining.is_zero() {
                    expired.push(*id);
                }
            }
        }
        for id in &expired {
            let _ = self.entries.remove(id);
        }
        expired
    }
}
