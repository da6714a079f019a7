//! Player progress that outlives a single dungeon.

use crawler_core::{ItemId, ProgressSink, RewardSink};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Records pushed whenever a new best is set, for an external service to pick up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Highest completed level after the update.
    pub max_level_reached: u32,
    /// Best score after the update.
    pub best_score: u32,
}

/// Session-wide progress: wallet, inventory, run score and records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionProgress {
    total_levels: u32,
    max_level_reached: u32,
    best_score: u32,
    currency: u64,
    current_score: u32,
    items: Vec<ItemId>,
    outbox: Vec<SyncRequest>,
}

impl SessionProgress {
    /// Fresh progress for a game with `total_levels` levels.
    #[must_use]
    pub fn new(total_levels: u32) -> Self {
        Self {
            total_levels: total_levels.max(1),
            max_level_reached: 0,
            best_score: 0,
            currency: 0,
            current_score: 0,
            items: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Restores previously saved records. `max_level_reached` is clamped to the level count.
    #[must_use]
    pub fn with_records(mut self, max_level_reached: u32, best_score: u32, currency: u64) -> Self {
        self.max_level_reached = max_level_reached.min(self.total_levels);
        self.best_score = best_score;
        self.currency = currency;
        self
    }

    /// Number of levels in the game.
    #[must_use]
    pub const fn total_levels(&self) -> u32 {
        self.total_levels
    }

    /// Highest completed level, 0 when none.
    #[must_use]
    pub const fn max_level_reached(&self) -> u32 {
        self.max_level_reached
    }

    /// Best score over every completed run.
    #[must_use]
    pub const fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Coins collected so far.
    #[must_use]
    pub const fn currency(&self) -> u64 {
        self.currency
    }

    /// Score of the run in progress.
    #[must_use]
    pub const fn current_score(&self) -> u32 {
        self.current_score
    }

    /// Items collected, in pickup order.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Level 1 is always playable; level `n` opens once `n - 1` is completed.
    #[must_use]
    pub fn is_level_unlocked(&self, level: u32) -> bool {
        (1..=self.max_level_reached.saturating_add(1)).contains(&level)
    }

    /// Raises the level and score records when beaten.
    ///
    /// Returns whether anything changed; a change queues one `SyncRequest`.
    pub fn update_progress(&mut self, level: u32, score: u32) -> bool {
        let level = level.min(self.total_levels);
        let mut updated = false;

        if level > self.max_level_reached {
            info!(from = self.max_level_reached, to = level, "new level record");
            self.max_level_reached = level;
            updated = true;
        }
        if score > self.best_score {
            info!(from = self.best_score, to = score, "new best score");
            self.best_score = score;
            updated = true;
        }

        if updated {
            self.outbox.push(SyncRequest {
                max_level_reached: self.max_level_reached,
                best_score: self.best_score,
            });
        } else {
            debug!(level, score, "replayed level without new records");
        }
        updated
    }

    /// Clears the run score before a new level starts.
    pub fn reset_current_score(&mut self) {
        self.current_score = 0;
    }

    /// Takes every queued sync notification, oldest first.
    pub fn drain_sync_requests(&mut self) -> Vec<SyncRequest> {
        std::mem::take(&mut self.outbox)
    }
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self::new(5)
    }
}

impl RewardSink for SessionProgress {
    fn add_currency(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(u64::from(amount));
        debug!(amount, total = self.currency, "currency added");
    }

    fn add_item(&mut self, item: ItemId) {
        debug!(item = item.as_str(), "item added");
        self.items.push(item);
    }
}

impl ProgressSink for SessionProgress {
    fn add_score(&mut self, points: u32) {
        self.current_score = self.current_score.saturating_add(points);
        debug!(points, total = self.current_score, "score added");
    }

    fn current_score(&self) -> u32 {
        self.current_score
    }

    fn record_level_completed(&mut self, level: u32, score: u32) {
        let _ = self.update_progress(level, score);
    }
}
