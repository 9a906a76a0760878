//! Exponential confidence decay for unused arms.
//!
//! An arm's base score is its mean observed reward per pull; the longer the
//! arm goes without a pull, the less that mean is trusted. This module is a
//! pure function of ledger state — nothing is cached, so the score is always
//! consistent with the ledger.

use crate::ArmRecord;

/// Decay-adjusted score for an arm at `current_round`.
///
/// Returns `None` for a never-pulled arm: cold-start arms are handled by an
/// explicit branch in the selector (they are always preferred), not by a
/// sentinel score.
///
/// Otherwise the score is
/// `mean_reward * exp(-decay_rate * (current_round - last_pulled))`.
///
/// `decay_rate` must be `>= 0`; a negative or non-finite rate disables decay
/// (treated as `0.0`), so `decay_rate = 0` yields pure UCB behavior.
#[must_use]
pub fn decayed_score(arm: &ArmRecord, current_round: u64, decay_rate: f64) -> Option<f64> {
    let mean = arm.mean_reward()?;
    let gap = arm.rounds_since_pull(current_round)? as f64;
    let rate = if decay_rate.is_finite() && decay_rate > 0.0 {
        decay_rate
    } else {
        0.0
    };
    Some(mean * (-rate * gap).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArmLedger;
    use proptest::prelude::*;

    fn pulled_arm(reward: f64, last_pulled: u64) -> ArmRecord {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("x").unwrap();
        ledger.record_pull("x", last_pulled, reward, 0.0).unwrap();
        ledger.get("x").unwrap().clone()
    }

    #[test]
    fn never_pulled_has_no_score() {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("x").unwrap();
        assert_eq!(decayed_score(ledger.get("x").unwrap(), 10, 0.5), None);
    }

    #[test]
    fn zero_rate_returns_plain_mean() {
        let arm = pulled_arm(0.8, 1);
        assert_eq!(decayed_score(&arm, 100, 0.0), Some(0.8));
    }

    #[test]
    fn bogus_rates_disable_decay() {
        let arm = pulled_arm(0.8, 1);
        assert_eq!(decayed_score(&arm, 50, -1.0), Some(0.8));
        assert_eq!(decayed_score(&arm, 50, f64::NAN), Some(0.8));
    }

    #[test]
    fn just_pulled_arm_is_undecayed() {
        let arm = pulled_arm(0.8, 7);
        let s = decayed_score(&arm, 7, 0.3).unwrap();
        assert!((s - 0.8).abs() < 1e-12);
    }

    proptest! {
        // Holding all else fixed, the score strictly decreases as the gap
        // since the last pull grows (for a positive mean and rate).
        #[test]
        fn score_strictly_decreases_with_idle_gap(
            mean in 0.01f64..10.0,
            rate in 0.001f64..0.5,
            last in 1u64..100,
            gap_a in 0u64..200,
            extra in 1u64..200,
        ) {
            let arm = pulled_arm(mean, last);
            let near = decayed_score(&arm, last + gap_a, rate).unwrap();
            let far = decayed_score(&arm, last + gap_a + extra, rate).unwrap();
            prop_assert!(far < near, "far={far} near={near}");
        }

        #[test]
        fn score_never_exceeds_mean_for_nonneg_rate(
            mean in 0.0f64..10.0,
            rate in 0.0f64..2.0,
            gap in 0u64..1000,
        ) {
            let arm = pulled_arm(mean, 1);
            let s = decayed_score(&arm, 1 + gap, rate).unwrap();
            prop_assert!(s <= mean + 1e-12);
            prop_assert!(s >= 0.0);
        }
    }
}
