use std::collections::HashMap;

use crawler_core::{Command, EnemyId, EnemyTier, Event, ItemId};
use crawler_system_loot::{roll_rarity, Config, DropSystem, LootTable, Rarity};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn death(id: u32, tier: EnemyTier) -> Event {
    Event::EnemyDied {
        enemy: EnemyId::new(id),
        tier,
        position: Vec3::ZERO,
    }
}

fn currency(commands: &[Command]) -> Vec<u32> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::AwardCurrency { amount } => Some(*amount),
            _ => None,
        })
        .collect()
}

fn items(commands: &[Command]) -> Vec<ItemId> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::AwardItem { item } => Some(item.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn rarity_frequencies_match_cumulative_table() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let samples = 100_000;
    let mut counts: HashMap<Rarity, u32> = HashMap::new();
    for _ in 0..samples {
        *counts.entry(roll_rarity(&mut rng)).or_default() += 1;
    }

    for (rarity, expected) in [
        (Rarity::Common, 0.50),
        (Rarity::Rare, 0.30),
        (Rarity::Epic, 0.15),
        (Rarity::Legendary, 0.05),
    ] {
        let observed = f64::from(counts.get(&rarity).copied().unwrap_or(0)) / f64::from(samples);
        assert!(
            (observed - expected).abs() < 0.01,
            "{rarity} observed {observed:.4}, expected {expected}"
        );
    }
}

#[test]
fn currency_stays_within_tier_ranges() {
    let mut system = DropSystem::new(Config::default(), 9);
    let events: Vec<Event> = (0..2_000)
        .map(|id| {
            let tier = if id % 2 == 0 {
                EnemyTier::Regular
            } else {
                EnemyTier::Boss
            };
            death(id, tier)
        })
        .collect();

    for event in &events {
        let mut out = Vec::new();
        system.handle(std::slice::from_ref(event), &mut out);
        let Event::EnemyDied { tier, .. } = event else {
            unreachable!("only deaths were scripted");
        };
        let awarded = currency(&out);
        assert_eq!(awarded.len(), 1);
        let range = match tier {
            EnemyTier::Regular => 10..30,
            EnemyTier::Boss => 100..200,
        };
        assert!(range.contains(&awarded[0]), "{tier:?} awarded {}", awarded[0]);
    }
}

#[test]
fn regular_enemies_never_drop_items() {
    let mut system = DropSystem::new(Config::default(), 1);
    let events: Vec<Event> = (0..500).map(|id| death(id, EnemyTier::Regular)).collect();
    let mut out = Vec::new();
    system.handle(&events, &mut out);
    assert!(items(&out).is_empty());
    assert_eq!(currency(&out).len(), 500);
}

#[test]
fn bosses_drop_items_at_configured_rate() {
    let mut system = DropSystem::new(Config::default(), 77);
    let bosses = 4_000;
    let events: Vec<Event> = (0..bosses).map(|id| death(id, EnemyTier::Boss)).collect();
    let mut out = Vec::new();
    system.handle(&events, &mut out);

    let dropped = items(&out);
    let rate = dropped.len() as f64 / f64::from(bosses);
    assert!((rate - 0.9).abs() < 0.03, "drop rate {rate}");

    let catalogue = LootTable::standard();
    for item in &dropped {
        assert!(catalogue.items().iter().any(|entry| &entry.item_id == item));
    }
}

#[test]
fn zero_drop_probability_and_empty_table_never_award_items() {
    for config in [
        Config {
            boss_drop_probability: 0.0,
            ..Config::default()
        },
        Config {
            table: LootTable::new(),
            ..Config::default()
        },
    ] {
        let mut system = DropSystem::new(config, 5);
        let events: Vec<Event> = (0..200).map(|id| death(id, EnemyTier::Boss)).collect();
        let mut out = Vec::new();
        system.handle(&events, &mut out);
        assert!(items(&out).is_empty());
        assert_eq!(currency(&out).len(), 200);
    }
}

#[test]
fn repeated_death_is_rewarded_once() {
    let mut system = DropSystem::new(Config::default(), 3);
    let mut out = Vec::new();
    system.handle(
        &[death(4, EnemyTier::Boss), death(4, EnemyTier::Boss)],
        &mut out,
    );
    system.handle(&[death(4, EnemyTier::Boss)], &mut out);
    assert_eq!(currency(&out).len(), 1);
}

#[test]
fn new_dungeon_forgets_rewarded_enemies() {
    let mut system = DropSystem::new(Config::default(), 3);
    let mut out = Vec::new();
    system.handle(
        &[
            death(0, EnemyTier::Regular),
            Event::DungeonConfigured {
                columns: 20,
                rows: 20,
            },
            death(0, EnemyTier::Regular),
        ],
        &mut out,
    );
    assert_eq!(currency(&out).len(), 2);
}
