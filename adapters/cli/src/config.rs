//! TOML configuration file with `[maze]`, `[enemy]`, `[loot]`, `[level]`,
//! `[player]` and `[traps]` tables. Every key is optional and defaults to the game's
//! tuning.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use crawler_core::{CellCoord, Direction, GridTransform, PrefabId};
use crawler_system_enemy_ai::Weapon;
use crawler_system_maze::Prefabs;
use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::simulation::{GunnerConfig, TrapLayout, Tuning};

/// Errors raised while loading or validating a configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("could not read configuration file {}", .path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or does not match the expected tables.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside the range the simulation accepts.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
}

/// Contents of a configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Master seed; the command line overrides it.
    pub(crate) seed: Option<u64>,
    pub(crate) maze: MazeSettings,
    pub(crate) enemy: EnemySettings,
    pub(crate) loot: LootSettings,
    pub(crate) level: LevelSettings,
    pub(crate) player: PlayerSettings,
    pub(crate) traps: TrapSettings,
}

/// `[maze]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MazeSettings {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) cell_size: f32,
    pub(crate) enemy_percentage: u32,
    pub(crate) entrance_width: u32,
    pub(crate) safe_zone: usize,
    /// Places a boss door in the middle of the east edge.
    pub(crate) boss_door: bool,
}

impl Default for MazeSettings {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            cell_size: 2.0,
            enemy_percentage: 10,
            entrance_width: 3,
            safe_zone: 3,
            boss_door: true,
        }
    }
}

/// Weapon selectable from the configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WeaponKind {
    Rifle,
    Launcher,
}

impl WeaponKind {
    fn weapon(self, range: f32) -> Weapon {
        match self {
            WeaponKind::Rifle => match Weapon::rifle() {
                Weapon::Hitscan { damage, .. } => Weapon::Hitscan { damage, range },
                other => other,
            },
            WeaponKind::Launcher => Weapon::launcher(),
        }
    }
}

/// `[enemy]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EnemySettings {
    pub(crate) sight_distance: f32,
    pub(crate) field_of_view: f32,
    pub(crate) fire_rate_secs: f32,
    pub(crate) lose_target_grace_secs: f32,
    pub(crate) wander_radius: f32,
    pub(crate) patrol_dwell_secs: f32,
    pub(crate) regular_weapon: WeaponKind,
    pub(crate) boss_weapon: WeaponKind,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            sight_distance: 20.0,
            field_of_view: 85.0,
            fire_rate_secs: 1.0,
            lose_target_grace_secs: 2.0,
            wander_radius: 10.0,
            patrol_dwell_secs: 3.0,
            regular_weapon: WeaponKind::Rifle,
            boss_weapon: WeaponKind::Launcher,
        }
    }
}

/// `[loot]` table. Coin ranges are half-open.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LootSettings {
    pub(crate) coins_min: u32,
    pub(crate) coins_max: u32,
    pub(crate) boss_coins_min: u32,
    pub(crate) boss_coins_max: u32,
    pub(crate) boss_drop_probability: f64,
}

impl Default for LootSettings {
    fn default() -> Self {
        Self {
            coins_min: 10,
            coins_max: 30,
            boss_coins_min: 100,
            boss_coins_max: 200,
            boss_drop_probability: 0.9,
        }
    }
}

/// `[level]` table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelSettings {
    pub(crate) number: u32,
    pub(crate) total_levels: u32,
    pub(crate) points_per_enemy: u32,
    pub(crate) points_per_boss: u32,
    pub(crate) completion_bonus: u32,
    pub(crate) return_to_menu_secs: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            number: 1,
            total_levels: 5,
            points_per_enemy: 10,
            points_per_boss: 500,
            completion_bonus: 200,
            return_to_menu_secs: 2.0,
        }
    }
}

/// `[player]` table: the automatic gunner standing in for player input.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerSettings {
    pub(crate) damage: f32,
    pub(crate) range: f32,
    pub(crate) fire_interval_secs: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            damage: 10.0,
            range: 20.0,
            fire_interval_secs: 0.5,
        }
    }
}

/// `[traps]` table. Placements name grid cells; cells outside the grid are
/// clamped and wall cells are skipped when the level is built.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TrapSettings {
    pub(crate) arrow_interval_secs: f32,
    pub(crate) arrow_damage: f32,
    pub(crate) plate_damage: f32,
    pub(crate) launchers: Vec<LauncherSettings>,
    pub(crate) plates: Vec<PlateSettings>,
}

impl Default for TrapSettings {
    fn default() -> Self {
        Self {
            arrow_interval_secs: 2.0,
            arrow_damage: 15.0,
            plate_damage: 20.0,
            launchers: Vec::new(),
            plates: Vec::new(),
        }
    }
}

/// One `[[traps.launchers]]` entry.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LauncherSettings {
    pub(crate) column: u32,
    pub(crate) row: u32,
    pub(crate) facing: Facing,
}

/// One `[[traps.plates]]` entry.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PlateSettings {
    pub(crate) column: u32,
    pub(crate) row: u32,
}

/// Grid direction a launcher shoots toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    fn direction(self) -> Direction {
        match self {
            Facing::North => Direction::North,
            Facing::East => Direction::East,
            Facing::South => Direction::South,
            Facing::West => Direction::West,
        }
    }
}

impl Settings {
    /// Reads and parses `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parses a configuration document.
    pub(crate) fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates every table and converts it into system configuration.
    pub(crate) fn tuning(&self) -> Result<Tuning, ConfigError> {
        Ok(Tuning {
            maze: self.maze_config()?,
            enemy: self.enemy_config()?,
            loot: self.loot_config()?,
            level: self.level_config()?,
            level_number: self.level.number,
            gunner: self.gunner_config()?,
            traps: self.trap_config()?,
            trap_layout: self.trap_layout(),
        })
    }

    fn maze_config(&self) -> Result<crawler_system_maze::Config, ConfigError> {
        let maze = &self.maze;
        if maze.enemy_percentage > 100 {
            return Err(invalid(
                "maze.enemy_percentage",
                format!("{} is above 100", maze.enemy_percentage),
            ));
        }
        positive("maze.cell_size", maze.cell_size)?;

        let transform = GridTransform::new(Vec3::ZERO, maze.cell_size, maze.width, maze.height);
        let populated = maze.width > 0 && maze.height > 0;
        let entrance_marker = populated.then(|| transform.cell_center(CellCoord::new(0, 0)));
        let boss_door_marker = (populated && maze.boss_door)
            .then(|| transform.cell_center(CellCoord::new(maze.width - 1, maze.height / 2)));

        Ok(crawler_system_maze::Config {
            columns: maze.width,
            rows: maze.height,
            cell_size: maze.cell_size,
            entrance_marker,
            boss_door_marker,
            entrance_width: maze.entrance_width.clamp(1, 10),
            enemy_percentage: maze.enemy_percentage,
            safe_zone: maze.safe_zone,
            prefabs: Prefabs {
                wall: Some(PrefabId::new("wall")),
                floor: Some(PrefabId::new("floor")),
                enemy: Some(PrefabId::new("enemy")),
                entrance_door: Some(PrefabId::new("entrance-door")),
                boss_door: maze.boss_door.then(|| PrefabId::new("boss-door")),
            },
            ..crawler_system_maze::Config::default()
        })
    }

    fn enemy_config(&self) -> Result<crawler_system_enemy_ai::Config, ConfigError> {
        let enemy = &self.enemy;
        positive("enemy.sight_distance", enemy.sight_distance)?;
        if !(0.0..=180.0).contains(&enemy.field_of_view) {
            return Err(invalid(
                "enemy.field_of_view",
                format!("{} is outside 0..=180 degrees", enemy.field_of_view),
            ));
        }
        positive("enemy.wander_radius", enemy.wander_radius)?;

        let mut config = crawler_system_enemy_ai::Config::default();
        config.sensor.sight_distance = enemy.sight_distance;
        config.sensor.field_of_view = enemy.field_of_view;
        config.fire_rate = seconds("enemy.fire_rate_secs", enemy.fire_rate_secs)?;
        config.lose_target_grace =
            seconds("enemy.lose_target_grace_secs", enemy.lose_target_grace_secs)?;
        config.patrol_dwell = seconds("enemy.patrol_dwell_secs", enemy.patrol_dwell_secs)?;
        config.wander_radius = enemy.wander_radius;
        config.regular.weapon = enemy.regular_weapon.weapon(enemy.sight_distance);
        config.boss.weapon = enemy.boss_weapon.weapon(enemy.sight_distance);
        Ok(config)
    }

    fn loot_config(&self) -> Result<crawler_system_loot::Config, ConfigError> {
        let loot = &self.loot;
        if loot.coins_min > loot.coins_max {
            return Err(invalid(
                "loot.coins_min",
                format!("{} exceeds coins_max {}", loot.coins_min, loot.coins_max),
            ));
        }
        if loot.boss_coins_min > loot.boss_coins_max {
            return Err(invalid(
                "loot.boss_coins_min",
                format!(
                    "{} exceeds boss_coins_max {}",
                    loot.boss_coins_min, loot.boss_coins_max
                ),
            ));
        }
        if !(0.0..=1.0).contains(&loot.boss_drop_probability) {
            return Err(invalid(
                "loot.boss_drop_probability",
                format!("{} is outside 0..=1", loot.boss_drop_probability),
            ));
        }

        Ok(crawler_system_loot::Config {
            coins: loot.coins_min..loot.coins_max,
            boss_coins: loot.boss_coins_min..loot.boss_coins_max,
            boss_drop_probability: loot.boss_drop_probability,
            ..crawler_system_loot::Config::default()
        })
    }

    fn level_config(&self) -> Result<crawler_system_progress::Config, ConfigError> {
        let level = &self.level;
        if level.total_levels == 0 {
            return Err(invalid("level.total_levels", "must be at least 1".into()));
        }
        if !(1..=level.total_levels).contains(&level.number) {
            return Err(invalid(
                "level.number",
                format!("{} is outside 1..={}", level.number, level.total_levels),
            ));
        }

        Ok(crawler_system_progress::Config {
            points_per_enemy: level.points_per_enemy,
            points_per_boss: level.points_per_boss,
            completion_bonus: level.completion_bonus,
            total_levels: level.total_levels,
            return_to_menu_delay: seconds("level.return_to_menu_secs", level.return_to_menu_secs)?,
        })
    }

    fn gunner_config(&self) -> Result<GunnerConfig, ConfigError> {
        let player = &self.player;
        positive("player.range", player.range)?;
        if player.damage < 0.0 {
            return Err(invalid(
                "player.damage",
                format!("{} is negative", player.damage),
            ));
        }
        Ok(GunnerConfig {
            damage: player.damage,
            range: player.range,
            fire_interval: seconds("player.fire_interval_secs", player.fire_interval_secs)?,
        })
    }

    fn trap_config(&self) -> Result<crawler_system_traps::Config, ConfigError> {
        let traps = &self.traps;
        for (field, value) in [
            ("traps.arrow_damage", traps.arrow_damage),
            ("traps.plate_damage", traps.plate_damage),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, format!("{value} is not a damage amount")));
            }
        }
        positive("traps.arrow_interval_secs", traps.arrow_interval_secs)?;

        Ok(crawler_system_traps::Config {
            arrow_interval: seconds("traps.arrow_interval_secs", traps.arrow_interval_secs)?,
            arrow_damage: traps.arrow_damage,
            arrow_damage_spread: crawler_system_traps::Config::default()
                .arrow_damage_spread
                .min(traps.arrow_damage),
            plate_damage: traps.plate_damage,
            ..crawler_system_traps::Config::default()
        })
    }

    fn trap_layout(&self) -> TrapLayout {
        TrapLayout {
            launchers: self
                .traps
                .launchers
                .iter()
                .map(|launcher| {
                    (
                        (launcher.column, launcher.row),
                        launcher.facing.direction(),
                    )
                })
                .collect(),
            plates: self
                .traps
                .plates
                .iter()
                .map(|plate| (plate.column, plate.row))
                .collect(),
        }
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not a positive number")))
    }
}

fn seconds(field: &'static str, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value)
        .map_err(|error| invalid(field, format!("{value} is not a duration: {error}")))
}
