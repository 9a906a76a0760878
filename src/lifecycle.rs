//! The Active / Dormant / Removed state machine.
//!
//! Evaluated once per completed round over every non-Removed arm:
//!
//! - Active → Dormant when the arm has been idle longer than
//!   `dormancy_threshold` rounds, or its trailing profit trend is negative.
//! - Dormant → Active when the arm would be competitive again (its
//!   undecayed mean exceeds the weakest Active arm's decayed score), or
//!   unconditionally once `reactivation_cooldown` rounds have elapsed —
//!   whichever comes first, so no arm is permanently stuck.
//! - Dormant → Removed when the arm has sat continuously Dormant for more
//!   than `max_dormant_rounds` without either reactivation rule firing.
//! - Active → Removed is not permitted here; manual removal on the engine
//!   is the only direct path to Removed.
//!
//! Safety override: a demotion that would leave zero Active arms is
//! deferred for the arm with the least-negative trailing profit — the
//! Active set never empties as a result of an evaluation. Deferrals are
//! reported, not silently dropped.
//!
//! Every applied transition carries a typed [`TransitionReason`] so callers
//! can log or replay exactly why an arm moved.

use crate::{decayed_score, ArmLedger, ArmState, ProfitAccumulator, Trend};

/// Thresholds governing the state machine. All open parameters — tune per
/// deployment.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifecycleConfig {
    /// Rounds of inactivity before an Active arm is demoted to Dormant.
    pub dormancy_threshold: u64,
    /// Rounds in Dormant after which an arm is reactivated unconditionally.
    pub reactivation_cooldown: u64,
    /// Rounds continuously Dormant after which an arm is removed.
    ///
    /// Only reachable when set below `reactivation_cooldown`: the
    /// reactivation rules are checked first, so with the default ordering
    /// (cooldown 30 < 100) arms cycle back for re-testing instead of being
    /// pruned.
    pub max_dormant_rounds: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            dormancy_threshold: 20,
            reactivation_cooldown: 30,
            max_dormant_rounds: 100,
        }
    }
}

/// Why an arm changed state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionReason {
    /// Active → Dormant: idle longer than the dormancy threshold.
    InactivityTimeout { rounds_idle: u64, threshold: u64 },
    /// Active → Dormant: trailing-window net profit is negative.
    NegativeTrend { trailing_sum: f64 },
    /// Dormant → Active: the arm's undecayed mean beats the current
    /// minimum decayed score among Active arms.
    CompetitiveAgain {
        hypothetical_score: f64,
        active_floor: f64,
    },
    /// Dormant → Active: the reactivation cooldown elapsed.
    CooldownElapsed { dormant_for: u64, cooldown: u64 },
    /// Dormant → Removed: continuously dormant past the expiry bound.
    DormancyExpired { dormant_for: u64, max_dormant: u64 },
    /// Removed by an explicit caller override on the engine.
    ManualRemoval,
}

/// One applied (or deferred) state change.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub arm: String,
    pub from: ArmState,
    pub to: ArmState,
    pub reason: TransitionReason,
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifecycleReport {
    /// Transitions applied this evaluation, in id order per phase
    /// (reactivations, removals, then demotions).
    pub applied: Vec<Transition>,
    /// Demotions suppressed by the never-empty-Active safety override.
    pub deferred: Vec<Transition>,
}

/// Evaluate the state machine once for the just-completed `round`.
///
/// Reactivations are decided against the Active set as it stood at the
/// start of the evaluation; demotions are then checked against the set
/// including this round's reactivations, so a reactivation can absorb what
/// would otherwise be a deferred demotion.
pub fn evaluate_lifecycle(
    ledger: &mut ArmLedger,
    profit: &ProfitAccumulator,
    round: u64,
    decay_rate: f64,
    cfg: LifecycleConfig,
) -> LifecycleReport {
    let active = ledger.list_by_state(ArmState::Active);
    let dormant = ledger.list_by_state(ArmState::Dormant);

    // Minimum decayed score among current Active arms. Never-pulled Active
    // arms have no finite score (conceptually infinite) and cannot lower
    // the floor.
    let active_floor = active
        .iter()
        .filter_map(|id| decayed_score(ledger.get(id)?, round, decay_rate))
        .min_by(f64::total_cmp);

    let mut reactivations: Vec<Transition> = Vec::new();
    let mut removals: Vec<Transition> = Vec::new();
    for id in &dormant {
        let Some(arm) = ledger.get(id) else { continue };
        let dormant_for = round.saturating_sub(arm.dormant_since.unwrap_or(round));

        // "As if pulled now": a zero idle gap, i.e. the plain mean.
        let competitive = match (arm.mean_reward(), active_floor) {
            (Some(mean), Some(floor)) if mean > floor => Some((mean, floor)),
            _ => None,
        };
        if let Some((mean, floor)) = competitive {
            reactivations.push(Transition {
                arm: id.clone(),
                from: ArmState::Dormant,
                to: ArmState::Active,
                reason: TransitionReason::CompetitiveAgain {
                    hypothetical_score: mean,
                    active_floor: floor,
                },
            });
        } else if dormant_for >= cfg.reactivation_cooldown {
            reactivations.push(Transition {
                arm: id.clone(),
                from: ArmState::Dormant,
                to: ArmState::Active,
                reason: TransitionReason::CooldownElapsed {
                    dormant_for,
                    cooldown: cfg.reactivation_cooldown,
                },
            });
        } else if dormant_for > cfg.max_dormant_rounds {
            removals.push(Transition {
                arm: id.clone(),
                from: ArmState::Dormant,
                to: ArmState::Removed,
                reason: TransitionReason::DormancyExpired {
                    dormant_for,
                    max_dormant: cfg.max_dormant_rounds,
                },
            });
        }
    }

    let mut demotions: Vec<Transition> = Vec::new();
    for id in &active {
        let Some(arm) = ledger.get(id) else { continue };
        let idle = arm.rounds_idle(round);
        if let Some(idle) = idle {
            if idle > cfg.dormancy_threshold {
                demotions.push(Transition {
                    arm: id.clone(),
                    from: ArmState::Active,
                    to: ArmState::Dormant,
                    reason: TransitionReason::InactivityTimeout {
                        rounds_idle: idle,
                        threshold: cfg.dormancy_threshold,
                    },
                });
                continue;
            }
        }
        if profit.trend(id) == Trend::Negative {
            demotions.push(Transition {
                arm: id.clone(),
                from: ArmState::Active,
                to: ArmState::Dormant,
                reason: TransitionReason::NegativeTrend {
                    trailing_sum: profit.trailing_sum(id).unwrap_or(0.0),
                },
            });
        }
    }

    // Safety override: never let an evaluation empty the Active set.
    let surviving = active.len() + reactivations.len() - demotions.len();
    let mut deferred = Vec::new();
    if surviving == 0 && !demotions.is_empty() {
        let mut keep = 0usize;
        let mut keep_sum = f64::NEG_INFINITY;
        for (i, t) in demotions.iter().enumerate() {
            let sum = profit.trailing_sum(&t.arm).unwrap_or(0.0);
            if sum > keep_sum {
                keep = i;
                keep_sum = sum;
            }
        }
        deferred.push(demotions.remove(keep));
    }

    let mut applied = Vec::new();
    for t in reactivations {
        ledger.set_state(&t.arm, ArmState::Active, round);
        applied.push(t);
    }
    for t in removals {
        ledger.set_state(&t.arm, ArmState::Removed, round);
        applied.push(t);
    }
    for t in demotions {
        ledger.set_state(&t.arm, ArmState::Dormant, round);
        applied.push(t);
    }

    LifecycleReport { applied, deferred }
}
