//! Line-of-sight sensor shared by every enemy brain.

use crawler_core::{AgentSnapshot, Collider, TargetSnapshot, WorldQuery};
use glam::Vec3;

/// Geometry of an enemy's vision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sensor {
    /// Range beyond which the target is never seen.
    pub sight_distance: f32,
    /// Maximum angle between facing and the target, in degrees.
    pub field_of_view: f32,
    /// Height of the eye above the pivot.
    pub eye_height: f32,
    /// Distance the eye sits in front of the pivot, clearing the enemy's own body.
    pub eye_forward_offset: f32,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            sight_distance: 20.0,
            field_of_view: 85.0,
            eye_height: 1.6,
            eye_forward_offset: 0.6,
        }
    }
}

impl Sensor {
    /// World-space origin of the occlusion ray.
    #[must_use]
    pub fn eye(&self, agent: &AgentSnapshot) -> Vec3 {
        agent.position + Vec3::Y * self.eye_height + agent.forward * self.eye_forward_offset
    }

    /// Reports whether `agent` can see `target`.
    ///
    /// The target must be within sight distance and inside the field of view,
    /// and the first collider struck by a ray from the eye toward the target's
    /// torso must be the target itself.
    #[must_use]
    pub fn can_see<Q>(&self, agent: &AgentSnapshot, target: &TargetSnapshot, world: &Q) -> bool
    where
        Q: WorldQuery + ?Sized,
    {
        if agent.position.distance(target.position) >= self.sight_distance {
            return false;
        }

        let eye = self.eye(agent);
        let direction = target.torso() - eye;
        if direction.length_squared() <= f32::EPSILON {
            return false;
        }
        if direction.angle_between(agent.forward).to_degrees() >= self.field_of_view {
            return false;
        }

        world
            .raycast(eye, direction, self.sight_distance)
            .map_or(false, |hit| hit.collider == Collider::Player)
    }
}
