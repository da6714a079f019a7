//! Score keeping and completion for the level being played.

use std::time::Duration;

use crawler_core::{EnemyTier, Event, ProgressSink};
use tracing::{debug, info, warn};

/// Scoring and pacing for a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Points for each regular enemy killed.
    pub points_per_enemy: u32,
    /// Points for the boss.
    pub points_per_boss: u32,
    /// Bonus added alongside the boss points.
    pub completion_bonus: u32,
    /// Number of levels in the game.
    pub total_levels: u32,
    /// Time between defeating the boss and returning to the menu.
    pub return_to_menu_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            points_per_enemy: 10,
            points_per_boss: 500,
            completion_bonus: 200,
            total_levels: 5,
            return_to_menu_delay: Duration::from_secs(2),
        }
    }
}

/// Where the level stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelPhase {
    /// Boss still alive.
    InProgress,
    /// Boss defeated; counting down to the menu.
    Victory {
        /// Time left before returning to the menu.
        remaining: Duration,
    },
    /// Level finished and handed back to the menu.
    ReturnToMenu,
}

/// Tracks kills for one level and records its completion.
#[derive(Clone, Debug)]
pub struct LevelTracker {
    config: Config,
    level: u32,
    phase: LevelPhase,
    boss_defeated: bool,
    kills: u32,
}

impl LevelTracker {
    /// Starts tracking `level`, clamped into `1..=total_levels`.
    #[must_use]
    pub fn new(config: Config, level: u32) -> Self {
        let level = level.clamp(1, config.total_levels.max(1));
        info!(level, "level started");
        Self {
            config,
            level,
            phase: LevelPhase::InProgress,
            boss_defeated: false,
            kills: 0,
        }
    }

    /// Scoring in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Level number, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> LevelPhase {
        self.phase
    }

    /// Regular enemies killed so far.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Whether the boss death was recorded.
    #[must_use]
    pub const fn is_boss_defeated(&self) -> bool {
        self.boss_defeated
    }

    /// Level to load after this one, or `None` once the game is finished.
    #[must_use]
    pub fn next_level(&self) -> Option<u32> {
        let next = self.level + 1;
        (next <= self.config.total_levels).then_some(next)
    }

    /// Scores deaths and advances the victory countdown.
    ///
    /// A new dungeon restarts the level. Only the first boss death completes
    /// it; later ones are ignored.
    pub fn handle<P>(&mut self, events: &[Event], progress: &mut P)
    where
        P: ProgressSink + ?Sized,
    {
        for event in events {
            match event {
                Event::DungeonConfigured { .. } => {
                    self.phase = LevelPhase::InProgress;
                    self.boss_defeated = false;
                    self.kills = 0;
                }
                Event::EnemyDied {
                    tier: EnemyTier::Regular,
                    ..
                } => {
                    self.kills += 1;
                    progress.add_score(self.config.points_per_enemy);
                }
                Event::EnemyDied {
                    enemy,
                    tier: EnemyTier::Boss,
                    ..
                } => {
                    if self.boss_defeated {
                        warn!(enemy = enemy.get(), "boss defeat already recorded");
                        continue;
                    }
                    self.complete(progress);
                }
                Event::TimeAdvanced { dt } => self.count_down(*dt),
                _ => {}
            }
        }
    }

    fn complete<P>(&mut self, progress: &mut P)
    where
        P: ProgressSink + ?Sized,
    {
        self.boss_defeated = true;
        progress.add_score(self.config.points_per_boss + self.config.completion_bonus);
        let score = progress.current_score();
        progress.record_level_completed(self.level, score);
        info!(level = self.level, score, "level completed");

        self.phase = LevelPhase::Victory {
            remaining: self.config.return_to_menu_delay,
        };
        self.count_down(Duration::ZERO);
    }

    fn count_down(&mut self, dt: Duration) {
        let LevelPhase::Victory { remaining } = self.phase else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            debug!(level = self.level, "returning to menu");
            self.phase = LevelPhase::ReturnToMenu;
        } else {
            self.phase = LevelPhase::Victory { remaining };
        }
    }
}
