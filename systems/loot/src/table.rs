//! Rarity buckets and the two-stage loot table sampler.

use std::fmt;

use crawler_core::ItemId;
use rand::{seq::SliceRandom, Rng};

/// Rarity bucket an item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    /// Rolled half of the time.
    Common,
    /// Rolled 30% of the time.
    Rare,
    /// Rolled 15% of the time.
    Epic,
    /// Rolled 5% of the time.
    Legendary,
}

impl Rarity {
    /// Every rarity from most to least frequent.
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Maps a uniform roll in `[0, 1)` through the cumulative distribution.
    #[must_use]
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.50 {
            Rarity::Common
        } else if roll < 0.80 {
            Rarity::Rare
        } else if roll < 0.95 {
            Rarity::Epic
        } else {
            Rarity::Legendary
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        };
        f.write_str(label)
    }
}

/// Draws a rarity from the fixed 50/30/15/5 distribution.
pub fn roll_rarity<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
    Rarity::from_roll(rng.gen::<f32>())
}

/// Catalogue entry of the loot table.
#[derive(Clone, Debug, PartialEq)]
pub struct LootItem {
    /// Item awarded when this entry is picked.
    pub item_id: ItemId,
    /// Per-item chance carried for catalogue display. Sampling never reads it.
    pub drop_chance: f32,
    /// Bucket the item is drawn from.
    pub rarity: Rarity,
}

/// Static collection of loot entries, partitioned by rarity when sampled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LootTable {
    items: Vec<LootItem>,
}

impl LootTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table shipped with the game: three common, three rare, three epic and
    /// two legendary items.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (id, chance, rarity) in [
            ("obj04", 0.50, Rarity::Common),
            ("obj05", 0.50, Rarity::Common),
            ("obj06", 0.50, Rarity::Common),
            ("obj09", 0.30, Rarity::Rare),
            ("obj10", 0.30, Rarity::Rare),
            ("obj11", 0.30, Rarity::Rare),
            ("obj02", 0.15, Rarity::Epic),
            ("obj14", 0.15, Rarity::Epic),
            ("obj15", 0.15, Rarity::Epic),
            ("obj01", 0.05, Rarity::Legendary),
            ("obj18", 0.05, Rarity::Legendary),
        ] {
            table.add_item(ItemId::new(id), chance, rarity);
        }
        table
    }

    /// Appends an entry.
    pub fn add_item(&mut self, item_id: ItemId, drop_chance: f32, rarity: Rarity) {
        self.items.push(LootItem {
            item_id,
            drop_chance,
            rarity,
        });
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LootItem] {
        &self.items
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rolls a rarity, then picks uniformly among the entries of that rarity.
    ///
    /// Returns `None` when the table is empty or the rolled bucket has no
    /// entries; neither case is an error.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&LootItem> {
        if self.items.is_empty() {
            return None;
        }

        let rarity = roll_rarity(rng);
        let bucket: Vec<&LootItem> = self
            .items
            .iter()
            .filter(|item| item.rarity == rarity)
            .collect();
        bucket.choose(rng).copied()
    }
}
