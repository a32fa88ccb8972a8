//! Derived hints shown next to a run: loot outlook, shop availability and
//! how far the run has climbed.

use crate::{
    detection::is_boss_roll,
    snapshot::RunSnapshot,
};

/// Floor shown as the end of the progress bar.
pub const MAX_FLOOR: u64 = 15;
pub const SHOP_FLOOR_INTERVAL: u64 = 3;

/// Gear drops awarded when a run ends on `floor`.
pub fn loot_count(floor: u64) -> u64 {
    match floor {
        0..5 => 0,
        5..10 => 1,
        10..15 => 2,
        _ => 3,
    }
}

pub fn loot_preview(floor: u64) -> String {
    match loot_count(floor) {
        0 => "No loot (floor < 5)".to_string(),
        1 => "1 gear drop".to_string(),
        n => format!("{n} gear drops"),
    }
}

pub fn shop_available(floor: u64) -> bool {
    floor > 0 && floor % SHOP_FLOOR_INTERVAL == 0
}

/// Whether the next roll lands on a boss.
pub fn boss_next(roll_count: u64) -> bool {
    is_boss_roll(roll_count.saturating_add(1))
}

/// Fraction of [`MAX_FLOOR`] reached, capped at 1.
pub fn floor_progress(floor: u64) -> f64 {
    (floor.min(MAX_FLOOR) as f64) / (MAX_FLOOR as f64)
}

pub fn can_use_potion(run: &RunSnapshot) -> bool {
    run.potion_count > 0 && run.current_hp < run.max_hp && !run.is_dead()
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn loot_count__steps_every_five_floors() {
        let counts: Vec<u64> = [0, 4, 5, 9, 10, 14, 15, 40]
            .into_iter()
            .map(loot_count)
            .collect();
        assert_eq!(counts, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn boss_next__saturates_at_the_roll_limit() {
        assert!(boss_next(u64::MAX - 1));
        assert!(boss_next(u64::MAX));
    }

    #[test]
    fn loot_preview__pluralizes_drops() {
        assert_eq!(loot_preview(2), "No loot (floor < 5)");
        assert_eq!(loot_preview(7), "1 gear drop");
        assert_eq!(loot_preview(12), "2 gear drops");
    }

    #[test]
    fn shop_available__on_every_third_floor_after_the_first() {
        assert!(!shop_available(0));
        assert!(!shop_available(2));
        assert!(shop_available(3));
        assert!(shop_available(9));
        assert!(!shop_available(10));
    }

    #[test]
    fn boss_next__before_each_fifth_roll() {
        assert!(boss_next(4));
        assert!(boss_next(9));
        assert!(!boss_next(5));
        assert!(!boss_next(0));
    }

    #[test]
    fn floor_progress__is_capped() {
        assert_eq!(floor_progress(0), 0.0);
        assert!((floor_progress(3) - 0.2).abs() < 1e-9);
        assert_eq!(floor_progress(15), 1.0);
        assert_eq!(floor_progress(99), 1.0);
    }

    #[test]
    fn can_use_potion__needs_stock_and_missing_hp() {
        let run = RunSnapshot {
            current_hp: 50,
            max_hp: 100,
            potion_count: 1,
            ..RunSnapshot::default()
        };
        assert!(can_use_potion(&run));
        assert!(!can_use_potion(&RunSnapshot {
            potion_count: 0,
            ..run
        }));
        assert!(!can_use_potion(&RunSnapshot {
            current_hp: 100,
            ..run
        }));
    }
}
