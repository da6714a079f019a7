#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static dungeon hazards: arrow launchers that fire on a fixed cadence and
//! pressure plates that hurt the player once.

use std::time::Duration;

use crawler_core::{Command, DamageTarget, Event, TargetSnapshot};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Tuning knobs shared by every trap.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Time between two arrows from the same launcher.
    pub arrow_interval: Duration,
    /// Arrow speed in world units per second.
    pub arrow_speed: f32,
    /// Centre of the arrow damage band.
    pub arrow_damage: f32,
    /// Half-width of the arrow damage band.
    pub arrow_damage_spread: f32,
    /// Time after which an arrow that hit nothing disappears.
    pub arrow_lifetime: Duration,
    /// Damage dealt by a pressure plate.
    pub plate_damage: f32,
    /// Horizontal distance from a plate's centre that triggers it.
    pub plate_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arrow_interval: Duration::from_secs(2),
            arrow_speed: 15.0,
            arrow_damage: 15.0,
            arrow_damage_spread: 5.0,
            arrow_lifetime: Duration::from_secs(3),
            plate_damage: 20.0,
            plate_radius: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Launcher {
    origin: Vec3,
    direction: Vec3,
    until_next: Duration,
}

#[derive(Clone, Debug)]
struct Plate {
    position: Vec3,
    sprung: bool,
}

impl Plate {
    fn covers(&self, point: Vec3, radius: f32) -> bool {
        let offset = point - self.position;
        Vec3::new(offset.x, 0.0, offset.z).length() <= radius
    }
}

/// Pure system that owns every trap of the current dungeon.
#[derive(Debug)]
pub struct Traps {
    config: Config,
    launchers: Vec<Launcher>,
    plates: Vec<Plate>,
    rng: ChaCha8Rng,
}

impl Traps {
    /// Creates a system without traps; arrow damage rolls derive from `seed`.
    #[must_use]
    pub fn new(config: Config, seed: u64) -> Self {
        Self {
            config,
            launchers: Vec::new(),
            plates: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Installs a launcher shooting from `origin` along `direction`. It fires
    /// on the first tick and then once per interval.
    pub fn add_launcher(&mut self, origin: Vec3, direction: Vec3) {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            warn!(?origin, "arrow launcher without a direction ignored");
            return;
        }
        self.launchers.push(Launcher {
            origin,
            direction,
            until_next: Duration::ZERO,
        });
    }

    /// Installs an armed pressure plate centred on `position`.
    pub fn add_plate(&mut self, position: Vec3) {
        self.plates.push(Plate {
            position,
            sprung: false,
        });
    }

    /// Number of installed launchers.
    #[must_use]
    pub fn launchers(&self) -> usize {
        self.launchers.len()
    }

    /// Number of plates that have not been triggered yet.
    #[must_use]
    pub fn armed_plates(&self) -> usize {
        self.plates.iter().filter(|plate| !plate.sprung).count()
    }

    /// Fires launchers whose cooldown elapsed and springs plates under the
    /// target. A new dungeon re-arms plates and resets launcher cooldowns.
    pub fn handle(
        &mut self,
        events: &[Event],
        target: Option<TargetSnapshot>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::DungeonConfigured { .. } => self.rearm(),
                Event::TimeAdvanced { dt } => {
                    self.fire_launchers(*dt, out);
                    self.spring_plates(target, out);
                }
                Event::PlayerPlaced { .. } => self.spring_plates(target, out),
                _ => {}
            }
        }
    }

    fn rearm(&mut self) {
        for launcher in &mut self.launchers {
            launcher.until_next = Duration::ZERO;
        }
        for plate in &mut self.plates {
            plate.sprung = false;
        }
    }

    fn fire_launchers(&mut self, dt: Duration, out: &mut Vec<Command>) {
        for index in 0..self.launchers.len() {
            let until_next = self.launchers[index].until_next.saturating_sub(dt);
            if !until_next.is_zero() {
                self.launchers[index].until_next = until_next;
                continue;
            }

            let damage = arrow_damage(&self.config, &mut self.rng);
            let launcher = &mut self.launchers[index];
            launcher.until_next = self.config.arrow_interval;
            debug!(origin = ?launcher.origin, damage, "arrow fired");
            out.push(Command::SpawnProjectile {
                origin: launcher.origin,
                velocity: launcher.direction * self.config.arrow_speed,
                damage,
                lifetime: self.config.arrow_lifetime,
            });
        }
    }

    fn spring_plates(&mut self, target: Option<TargetSnapshot>, out: &mut Vec<Command>) {
        let Some(target) = target else {
            return;
        };
        let radius = self.config.plate_radius;
        for plate in &mut self.plates {
            if plate.sprung || !plate.covers(target.position, radius) {
                continue;
            }
            plate.sprung = true;
            info!(
                position = ?plate.position,
                damage = self.config.plate_damage,
                "pressure plate sprung"
            );
            out.push(Command::ApplyDamage {
                target: DamageTarget::Player,
                amount: self.config.plate_damage,
            });
        }
    }
}

/// Uniform in `[damage - spread, damage + spread)`; a non-positive spread is fixed.
fn arrow_damage<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> f32 {
    let spread = config.arrow_damage_spread;
    if !(spread > 0.0) {
        return config.arrow_damage;
    }
    rng.gen_range(config.arrow_damage - spread..config.arrow_damage + spread)
}
