//! Infers what happened on a dice roll from the change in run counters.
//!
//! The run contract does not emit an event describing the tile outcome, so
//! the client compares the run before and after the roll. Rules are checked
//! in a fixed order and the first match wins:
//!
//! 1. gems went up: a fight was won (damage taken is any hp lost);
//! 2. potions went up: a lucky gacha tile;
//! 3. hp went up: a heal tile;
//! 4. hp went down: a trap;
//! 5. otherwise nothing worth reporting.

use crate::snapshot::RunSnapshot;
use std::fmt;

/// Every fifth roll lands on a boss.
pub const BOSS_ROLL_INTERVAL: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredEvent {
    Combat {
        gems_gained: u64,
        damage_taken: u64,
        is_boss: bool,
    },
    Heal {
        hp_gained: u64,
    },
    BadEvent {
        hp_lost: u64,
    },
    LuckyGacha {
        potions_gained: u64,
    },
}

impl InferredEvent {
    pub fn is_combat(&self) -> bool {
        matches!(self, InferredEvent::Combat { .. })
    }
}

impl fmt::Display for InferredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            InferredEvent::Combat {
                gems_gained,
                damage_taken,
                is_boss,
            } => {
                let title = if is_boss { "BOSS!" } else { "Combat!" };
                write!(f, "{title} +{gems_gained} gems")?;
                if damage_taken > 0 {
                    write!(f, ", -{damage_taken} HP")?;
                }
                Ok(())
            }
            InferredEvent::Heal { hp_gained } => write!(f, "Healed! +{hp_gained} HP"),
            InferredEvent::BadEvent { hp_lost } => write!(f, "Trap! -{hp_lost} HP"),
            InferredEvent::LuckyGacha { potions_gained } => {
                write!(f, "Lucky! +{potions_gained} Potion")
            }
        }
    }
}

pub fn is_boss_roll(roll_count: u64) -> bool {
    roll_count > 0 && roll_count % BOSS_ROLL_INTERVAL == 0
}

pub fn classify(previous: &RunSnapshot, next: &RunSnapshot) -> Option<InferredEvent> {
    if next.gems > previous.gems {
        return Some(InferredEvent::Combat {
            gems_gained: next.gems - previous.gems,
            damage_taken: previous.current_hp.saturating_sub(next.current_hp),
            is_boss: is_boss_roll(next.roll_count),
        });
    }
    if next.potion_count > previous.potion_count {
        return Some(InferredEvent::LuckyGacha {
            potions_gained: next.potion_count - previous.potion_count,
        });
    }
    if next.current_hp > previous.current_hp {
        return Some(InferredEvent::Heal {
            hp_gained: next.current_hp - previous.current_hp,
        });
    }
    if next.current_hp < previous.current_hp {
        return Some(InferredEvent::BadEvent {
            hp_lost: previous.current_hp - next.current_hp,
        });
    }
    None
}
