#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session progress and level completion: the wallet and records that
//! survive between dungeons, and the per-level score keeper that feeds them.

use crawler_core::{Command, RewardSink};

mod level;
mod session;

pub use level::{Config, LevelPhase, LevelTracker};
pub use session::{SessionProgress, SyncRequest};

/// Forwards reward commands to `sink` and ignores every other command.
///
/// Returns how many rewards were delivered.
pub fn apply_rewards<S>(commands: &[Command], sink: &mut S) -> usize
where
    S: RewardSink + ?Sized,
{
    let mut delivered = 0;
    for command in commands {
        match command {
            Command::AwardCurrency { amount } => sink.add_currency(*amount),
            Command::AwardItem { item } => sink.add_item(item.clone()),
            _ => continue,
        }
        delivered += 1;
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::{DamageTarget, ItemId};

    #[test]
    fn only_reward_commands_reach_the_sink() {
        let mut progress = SessionProgress::default();
        let delivered = apply_rewards(
            &[
                Command::AwardCurrency { amount: 12 },
                Command::ApplyDamage {
                    target: DamageTarget::Player,
                    amount: 10.0,
                },
                Command::AwardItem {
                    item: ItemId::new("obj04"),
                },
                Command::AwardCurrency { amount: 3 },
            ],
            &mut progress,
        );
        assert_eq!(delivered, 3);
        assert_eq!(progress.currency(), 15);
        assert_eq!(progress.items(), &[ItemId::new("obj04")]);
    }
}
