//! The round orchestrator: select → observe → account → re-evaluate.
//!
//! One [`BanditEngine`] runs rounds strictly sequentially. A round is the
//! atomic unit of work: [`BanditEngine::next_round`] picks an arm from the
//! Active set and parks it as pending; [`BanditEngine::report_outcome`]
//! completes the round by recording the pull, updating profit accounting,
//! incrementing the round counter, and re-evaluating the lifecycle policy.
//! A failed report leaves everything untouched — a round either completes
//! fully or never happened.
//!
//! The engine is a plain owned value with `&mut self` methods; nothing here
//! blocks or does I/O. Callers sharing one engine across threads must hold
//! a mutex around the whole select-through-report sequence. Independent
//! engines share no state and run in parallel freely.

use crate::{
    evaluate_lifecycle, select_ucb, ArmLedger, ArmRecord, ArmState, BanditError, LifecycleConfig,
    LifecycleReport, ProfitAccumulator, Transition, TransitionReason, UcbSelection,
};

/// Valid ranges for reported rewards and costs.
///
/// Non-finite values are always rejected; the bounds below additionally
/// constrain the finite range. Defaults accept any finite value.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutcomeBounds {
    pub min_reward: f64,
    pub max_reward: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl Default for OutcomeBounds {
    fn default() -> Self {
        Self {
            min_reward: f64::NEG_INFINITY,
            max_reward: f64::INFINITY,
            min_cost: f64::NEG_INFINITY,
            max_cost: f64::INFINITY,
        }
    }
}

impl OutcomeBounds {
    /// Bounds for domains where only non-negative rewards and costs are
    /// meaningful.
    pub fn non_negative() -> Self {
        Self {
            min_reward: 0.0,
            max_reward: f64::INFINITY,
            min_cost: 0.0,
            max_cost: f64::INFINITY,
        }
    }

    fn accepts(&self, reward: f64, cost: f64) -> bool {
        reward.is_finite()
            && cost.is_finite()
            && reward >= self.min_reward
            && reward <= self.max_reward
            && cost >= self.min_cost
            && cost <= self.max_cost
    }
}

/// Engine configuration. Every field is an open parameter; the defaults are
/// conservative, not tuned.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// UCB exploration constant `c`.
    pub exploration_constant: f64,
    /// Per-round exponential decay rate for unused arms; `0` disables
    /// decay entirely (pure UCB).
    pub decay_rate: f64,
    /// Trailing-window size for the profit trend signal.
    pub profit_window: usize,
    /// Dormancy / reactivation / expiry thresholds.
    pub lifecycle: LifecycleConfig,
    /// Valid range for reported outcomes.
    pub outcome_bounds: OutcomeBounds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exploration_constant: 2.0,
            decay_rate: 0.0,
            profit_window: 10,
            lifecycle: LifecycleConfig::default(),
            outcome_bounds: OutcomeBounds::default(),
        }
    }
}

/// Audit record of one completed round.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// The completed round's (1-based) index.
    pub round: u64,
    /// The pulled arm.
    pub arm: String,
    /// Net profit (`reward - cost`) of this round.
    pub net_profit: f64,
    /// Lifecycle transitions this round's evaluation applied or deferred.
    pub lifecycle: LifecycleReport,
}

/// Serializable per-arm row of an engine snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmSnapshot {
    pub id: String,
    pub pulls: u64,
    pub reward_sum: f64,
    pub cost_sum: f64,
    pub state: ArmState,
    pub last_pulled: Option<u64>,
    pub dormant_since: Option<u64>,
    pub reactivated_at: Option<u64>,
    /// Trailing net-profit window, oldest first. Needed to resume the
    /// trend rule deterministically; totals are derived from the sums.
    pub trailing_profit: Vec<f64>,
}

/// Full engine state for external persistence.
///
/// [`BanditEngine::restore`] rebuilds an engine from this such that the
/// subsequent decision stream is identical to the uninterrupted one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Completed-round counter.
    pub round: u64,
    /// One row per arm, in id order.
    pub arms: Vec<ArmSnapshot>,
}

/// A sequential K-armed bandit engine with decay and arm dormancy.
#[derive(Debug, Clone)]
pub struct BanditEngine {
    cfg: EngineConfig,
    ledger: ArmLedger,
    profit: ProfitAccumulator,
    round: u64,
    pending: Option<String>,
}

impl BanditEngine {
    /// Create an engine with no arms.
    pub fn new(cfg: EngineConfig) -> Self {
        let profit = ProfitAccumulator::new(cfg.profit_window);
        Self {
            cfg,
            ledger: ArmLedger::new(),
            profit,
            round: 0,
            pending: None,
        }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Number of completed rounds.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// The arm selected by an unreported `next_round`, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Read access to the arm ledger.
    pub fn ledger(&self) -> &ArmLedger {
        &self.ledger
    }

    /// Global cumulative net profit.
    pub fn total_profit(&self) -> f64 {
        self.profit.total_profit()
    }

    /// Cumulative net profit of one arm.
    pub fn arm_profit(&self, id: &str) -> f64 {
        self.profit.arm_profit(id)
    }

    /// Add a new arm (Active, zeroed statistics).
    pub fn add_arm(&mut self, id: &str) -> Result<(), BanditError> {
        self.ledger.add_arm(id)
    }

    /// Manual override: immediately and permanently remove an arm.
    ///
    /// Fails while the arm is awaiting an outcome — the in-flight round
    /// must complete (or never happen) as a whole.
    pub fn remove_arm(&mut self, id: &str) -> Result<Transition, BanditError> {
        let arm = self
            .ledger
            .get(id)
            .ok_or_else(|| BanditError::UnknownArm { id: id.to_string() })?;
        if self.pending.as_deref() == Some(id) {
            return Err(BanditError::RoundInProgress {
                pending: id.to_string(),
            });
        }
        let from = arm.state;
        self.ledger.set_state(id, ArmState::Removed, self.round);
        Ok(Transition {
            arm: id.to_string(),
            from,
            to: ArmState::Removed,
            reason: TransitionReason::ManualRemoval,
        })
    }

    /// Run selection for the next round and return the chosen arm id.
    pub fn next_round(&mut self) -> Result<String, BanditError> {
        self.next_round_explain().map(|sel| sel.chosen)
    }

    /// Run selection for the next round, returning the full score table.
    pub fn next_round_explain(&mut self) -> Result<UcbSelection, BanditError> {
        if let Some(pending) = &self.pending {
            return Err(BanditError::RoundInProgress {
                pending: pending.clone(),
            });
        }
        let eligible = self.ledger.list_by_state(ArmState::Active);
        let sel = select_ucb(
            &eligible,
            &self.ledger,
            self.round + 1,
            self.cfg.exploration_constant,
            self.cfg.decay_rate,
        )?;
        self.pending = Some(sel.chosen.clone());
        Ok(sel)
    }

    /// Complete the in-flight round with its observed outcome.
    ///
    /// Validation happens before any mutation: on error the round stays
    /// pending and no statistic changes.
    pub fn report_outcome(
        &mut self,
        id: &str,
        reward: f64,
        cost: f64,
    ) -> Result<RoundReport, BanditError> {
        if self.ledger.get(id).is_none() {
            return Err(BanditError::UnknownArm { id: id.to_string() });
        }
        let Some(selected) = self.pending.clone() else {
            return Err(BanditError::NoRoundInProgress);
        };
        if selected != id {
            return Err(BanditError::OutcomeArmMismatch {
                selected,
                reported: id.to_string(),
            });
        }
        if !self.cfg.outcome_bounds.accepts(reward, cost) {
            return Err(BanditError::InvalidOutcome {
                id: id.to_string(),
                reward,
                cost,
            });
        }

        self.round += 1;
        self.pending = None;
        self.ledger.record_pull(id, self.round, reward, cost)?;
        let net_profit = self.profit.record_outcome(id, reward, cost);
        let lifecycle = evaluate_lifecycle(
            &mut self.ledger,
            &self.profit,
            self.round,
            self.cfg.decay_rate,
            self.cfg.lifecycle,
        );
        Ok(RoundReport {
            round: self.round,
            arm: id.to_string(),
            net_profit,
            lifecycle,
        })
    }

    /// Serialize the full decision-relevant state.
    ///
    /// Snapshots are only taken between rounds; an in-flight selection is
    /// not part of the persisted state (the round never happened).
    pub fn snapshot(&self) -> Snapshot {
        let arms = self
            .ledger
            .iter()
            .map(|(id, arm)| ArmSnapshot {
                id: id.clone(),
                pulls: arm.pulls,
                reward_sum: arm.reward_sum,
                cost_sum: arm.cost_sum,
                state: arm.state,
                last_pulled: arm.last_pulled,
                dormant_since: arm.dormant_since,
                reactivated_at: arm.reactivated_at,
                trailing_profit: self.profit.trailing(id),
            })
            .collect();
        Snapshot {
            round: self.round,
            arms,
        }
    }

    /// Rebuild an engine from a snapshot.
    ///
    /// Fails with [`BanditError::DuplicateArm`] if the snapshot contains
    /// the same id twice.
    pub fn restore(cfg: EngineConfig, snapshot: &Snapshot) -> Result<Self, BanditError> {
        let mut engine = Self::new(cfg);
        engine.round = snapshot.round;
        for row in &snapshot.arms {
            engine.ledger.insert_record(
                &row.id,
                ArmRecord {
                    pulls: row.pulls,
                    reward_sum: row.reward_sum,
                    cost_sum: row.cost_sum,
                    last_pulled: row.last_pulled,
                    state: row.state,
                    dormant_since: row.dormant_since,
                    reactivated_at: row.reactivated_at,
                },
            )?;
            engine.profit.restore_arm(
                &row.id,
                row.reward_sum - row.cost_sum,
                &row.trailing_profit,
            );
        }
        Ok(engine)
    }
}
