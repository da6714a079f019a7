#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reward sampling on enemy death: currency for every kill and a weighted
//! item drop for bosses.

use std::{collections::BTreeSet, ops::Range};

use crawler_core::{Command, EnemyId, EnemyTier, Event};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

mod table;

pub use table::{roll_rarity, LootItem, LootTable, Rarity};

/// Tuning knobs for reward sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Coins awarded for a regular enemy, drawn from `[start, end)`.
    pub coins: Range<u32>,
    /// Coins awarded for a boss, drawn from `[start, end)`.
    pub boss_coins: Range<u32>,
    /// Probability in `[0, 1]` that a boss drops an item at all.
    pub boss_drop_probability: f64,
    /// Items a boss can drop.
    pub table: LootTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coins: 10..30,
            boss_coins: 100..200,
            boss_drop_probability: 0.9,
            table: LootTable::standard(),
        }
    }
}

/// Pure system that converts enemy deaths into reward commands.
#[derive(Debug)]
pub struct DropSystem {
    config: Config,
    processed: BTreeSet<EnemyId>,
    rng: ChaCha8Rng,
}

impl DropSystem {
    /// Creates the system; every random draw derives from `seed`.
    #[must_use]
    pub fn new(config: Config, seed: u64) -> Self {
        Self {
            config,
            processed: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Emits `AwardCurrency` for every first death and, for bosses that pass
    /// the drop roll, one `AwardItem`.
    ///
    /// A repeated death notification for the same enemy is ignored.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::DungeonConfigured { .. } => self.processed.clear(),
                Event::EnemyDied { enemy, tier, .. } => {
                    if !self.processed.insert(*enemy) {
                        debug!(enemy = enemy.get(), "death already rewarded");
                        continue;
                    }
                    self.reward(*enemy, *tier, out);
                }
                _ => {}
            }
        }
    }

    fn reward(&mut self, enemy: EnemyId, tier: EnemyTier, out: &mut Vec<Command>) {
        let range = match tier {
            EnemyTier::Regular => self.config.coins.clone(),
            EnemyTier::Boss => self.config.boss_coins.clone(),
        };
        let amount = draw_coins(range, &mut self.rng);
        info!(enemy = enemy.get(), ?tier, coins = amount, "enemy defeated");
        out.push(Command::AwardCurrency { amount });

        if tier != EnemyTier::Boss {
            return;
        }

        let probability = self.config.boss_drop_probability.clamp(0.0, 1.0);
        if !self.rng.gen_bool(probability) {
            info!(enemy = enemy.get(), "boss dropped nothing");
            return;
        }

        match self.config.table.roll(&mut self.rng) {
            Some(item) => {
                info!(
                    enemy = enemy.get(),
                    item = item.item_id.as_str(),
                    rarity = %item.rarity,
                    "loot dropped"
                );
                out.push(Command::AwardItem {
                    item: item.item_id.clone(),
                });
            }
            None => debug!(enemy = enemy.get(), "rolled an empty rarity bucket"),
        }
    }
}

/// Uniform draw from `[start, end)`; an empty range yields its start.
fn draw_coins<R: Rng + ?Sized>(range: Range<u32>, rng: &mut R) -> u32 {
    if range.is_empty() {
        return range.start;
    }
    rng.gen_range(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_coin_range_returns_its_start() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(draw_coins(5..5, &mut rng), 5);
    }
}
