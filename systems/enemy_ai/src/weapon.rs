//! Shooting modes and damage rolls.

use std::time::Duration;

use crawler_core::{Collider, Command, DamageTarget, TargetSnapshot, WorldQuery};
use glam::Vec3;
use rand::Rng;

/// Amount of damage a single shot deals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Damage {
    /// Always the same amount.
    Fixed(f32),
    /// Uniform in `[base - spread, base + spread)`.
    Banded {
        /// Centre of the band.
        base: f32,
        /// Half-width of the band.
        spread: f32,
    },
}

impl Damage {
    /// Draws the damage of one shot.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            Damage::Fixed(amount) => amount,
            Damage::Banded { base, spread } if spread > 0.0 => {
                rng.gen_range(base - spread..base + spread)
            }
            Damage::Banded { base, .. } => base,
        }
    }
}

/// How a shot reaches the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Weapon {
    /// Instantaneous ray; damages the target when it is the first collider hit.
    Hitscan {
        /// Damage dealt on a hit.
        damage: Damage,
        /// Maximum reach of the ray.
        range: f32,
    },
    /// World-simulated projectile that damages the target on impact.
    Projectile {
        /// Damage carried by the projectile.
        damage: Damage,
        /// Travel speed in world units per second.
        speed: f32,
        /// Time after which the projectile expires without impact.
        lifetime: Duration,
    },
}

impl Weapon {
    /// Default hit-scan rifle: ten damage, reaching as far as enemies can see.
    #[must_use]
    pub const fn rifle() -> Self {
        Weapon::Hitscan {
            damage: Damage::Fixed(10.0),
            range: 20.0,
        }
    }

    /// Default projectile launcher: fifteen give or take five damage.
    #[must_use]
    pub const fn launcher() -> Self {
        Weapon::Projectile {
            damage: Damage::Banded {
                base: 15.0,
                spread: 5.0,
            },
            speed: 15.0,
            lifetime: Duration::from_secs(3),
        }
    }

    /// Fires one shot from `origin` toward the target's torso.
    pub fn fire<Q, R>(
        &self,
        origin: Vec3,
        target: &TargetSnapshot,
        world: &Q,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        Q: WorldQuery + ?Sized,
        R: Rng + ?Sized,
    {
        let direction = (target.torso() - origin).normalize_or_zero();
        if direction == Vec3::ZERO {
            return;
        }

        match *self {
            Weapon::Hitscan { damage, range } => {
                let struck = world
                    .raycast(origin, direction, range)
                    .map_or(false, |hit| hit.collider == Collider::Player);
                if struck {
                    out.push(Command::ApplyDamage {
                        target: DamageTarget::Player,
                        amount: damage.roll(rng),
                    });
                }
            }
            Weapon::Projectile {
                damage,
                speed,
                lifetime,
            } => out.push(Command::SpawnProjectile {
                origin,
                velocity: direction * speed,
                damage: damage.roll(rng),
                lifetime,
            }),
        }
    }
}
