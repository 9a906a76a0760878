//! Per-arm accounting: pulls, cumulative reward/cost, lifecycle state.
//!
//! The ledger is pure bookkeeping — no scoring or policy logic lives here.
//! Arms are keyed by `String` id in a `BTreeMap`, so iteration order is the
//! id order and smallest-id tie-breaking falls out of plain iteration.
//!
//! Invariants:
//! - pull counts and cumulative totals never decrease;
//! - totals change only via [`ArmLedger::record_pull`];
//! - [`ArmState::Removed`] is terminal — a removed arm stays in the ledger
//!   for audit but is never selectable again.

use std::collections::BTreeMap;

use crate::BanditError;

/// Lifecycle state of an arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArmState {
    /// Selectable.
    Active,
    /// Not selectable, eligible for reactivation.
    Dormant,
    /// Terminal: never selectable again.
    Removed,
}

/// Accounting record for a single arm.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmRecord {
    /// Number of recorded pulls.
    pub pulls: u64,
    /// Sum of observed rewards over all pulls.
    pub reward_sum: f64,
    /// Sum of observed costs over all pulls.
    pub cost_sum: f64,
    /// Round of the most recent pull; `None` = never pulled.
    pub last_pulled: Option<u64>,
    /// Current lifecycle state.
    pub state: ArmState,
    /// Round at which the arm entered `Dormant`; `None` unless Dormant.
    ///
    /// Drives the reactivation cooldown and the dormancy-expiry rule.
    pub dormant_since: Option<u64>,
    /// Round of the most recent Dormant → Active transition, if any.
    ///
    /// Restarts the idleness clock: without it a cooldown reactivation
    /// would be undone at the very next evaluation, since the arm's last
    /// pull predates its whole dormant stretch.
    pub reactivated_at: Option<u64>,
}

impl ArmRecord {
    fn new() -> Self {
        Self {
            pulls: 0,
            reward_sum: 0.0,
            cost_sum: 0.0,
            last_pulled: None,
            state: ArmState::Active,
            dormant_since: None,
            reactivated_at: None,
        }
    }

    /// Mean observed reward per pull, or `None` if never pulled.
    pub fn mean_reward(&self) -> Option<f64> {
        if self.pulls == 0 {
            None
        } else {
            Some(self.reward_sum / self.pulls as f64)
        }
    }

    /// Cumulative net profit (reward minus cost) over all pulls.
    pub fn net_profit(&self) -> f64 {
        self.reward_sum - self.cost_sum
    }

    /// Rounds elapsed since the last pull, or `None` if never pulled.
    pub fn rounds_since_pull(&self, current_round: u64) -> Option<u64> {
        self.last_pulled
            .map(|last| current_round.saturating_sub(last))
    }

    /// Rounds since the arm was last pulled or reactivated, whichever is
    /// more recent. This is the idleness clock the dormancy rule uses.
    pub fn rounds_idle(&self, current_round: u64) -> Option<u64> {
        match (self.last_pulled, self.reactivated_at) {
            (None, None) => None,
            (a, b) => Some(current_round.saturating_sub(a.max(b).unwrap_or(0))),
        }
    }
}

/// The arm table: one [`ArmRecord`] per unique id.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmLedger {
    arms: BTreeMap<String, ArmRecord>,
}

impl ArmLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new arm in `Active` state with zeroed statistics.
    pub fn add_arm(&mut self, id: &str) -> Result<(), BanditError> {
        if self.arms.contains_key(id) {
            return Err(BanditError::DuplicateArm { id: id.to_string() });
        }
        self.arms.insert(id.to_string(), ArmRecord::new());
        Ok(())
    }

    /// Record one pull: increment the count, accumulate reward/cost, stamp
    /// the last-pulled round.
    pub fn record_pull(
        &mut self,
        id: &str,
        round: u64,
        reward: f64,
        cost: f64,
    ) -> Result<(), BanditError> {
        let arm = self
            .arms
            .get_mut(id)
            .ok_or_else(|| BanditError::UnknownArm { id: id.to_string() })?;
        arm.pulls = arm.pulls.saturating_add(1);
        arm.reward_sum += reward;
        arm.cost_sum += cost;
        arm.last_pulled = Some(round);
        Ok(())
    }

    /// Read-only lookup.
    pub fn get(&self, id: &str) -> Option<&ArmRecord> {
        self.arms.get(id)
    }

    /// Ids of arms in the given state, in id order.
    pub fn list_by_state(&self, state: ArmState) -> Vec<String> {
        self.arms
            .iter()
            .filter(|(_, a)| a.state == state)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of arms in the given state.
    pub fn count_by_state(&self, state: ArmState) -> usize {
        self.arms.values().filter(|a| a.state == state).count()
    }

    /// Iterate all arms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArmRecord)> + '_ {
        self.arms.iter()
    }

    /// Total number of arms, regardless of state.
    pub fn len(&self) -> usize {
        self.arms.len()
    }

    /// Whether the ledger has no arms at all.
    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub(crate) fn set_state(&mut self, id: &str, state: ArmState, round: u64) {
        if let Some(arm) = self.arms.get_mut(id) {
            // Removed is terminal.
            if arm.state == ArmState::Removed {
                return;
            }
            if state == ArmState::Active && arm.state == ArmState::Dormant {
                arm.reactivated_at = Some(round);
            }
            arm.state = state;
            arm.dormant_since = match state {
                ArmState::Dormant => Some(round),
                _ => None,
            };
        }
    }

    pub(crate) fn insert_record(
        &mut self,
        id: &str,
        record: ArmRecord,
    ) -> Result<(), BanditError> {
        if self.arms.contains_key(id) {
            return Err(BanditError::DuplicateArm { id: id.to_string() });
        }
        self.arms.insert(id.to_string(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_arm_initializes_active_and_unpulled() {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("a").unwrap();
        let arm = ledger.get("a").unwrap();
        assert_eq!(arm.pulls, 0);
        assert_eq!(arm.state, ArmState::Active);
        assert_eq!(arm.last_pulled, None);
        assert_eq!(arm.mean_reward(), None);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("a").unwrap();
        assert_eq!(
            ledger.add_arm("a"),
            Err(BanditError::DuplicateArm { id: "a".into() })
        );
    }

    #[test]
    fn record_pull_accumulates_and_stamps() {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("a").unwrap();
        ledger.record_pull("a", 1, 1.0, 0.25).unwrap();
        ledger.record_pull("a", 4, 0.5, 0.25).unwrap();
        let arm = ledger.get("a").unwrap();
        assert_eq!(arm.pulls, 2);
        assert_eq!(arm.reward_sum, 1.5);
        assert_eq!(arm.cost_sum, 0.5);
        assert_eq!(arm.last_pulled, Some(4));
        assert_eq!(arm.mean_reward(), Some(0.75));
        assert_eq!(arm.net_profit(), 1.0);
        assert_eq!(arm.rounds_since_pull(10), Some(6));
    }

    #[test]
    fn record_pull_on_unknown_arm_fails() {
        let mut ledger = ArmLedger::new();
        assert_eq!(
            ledger.record_pull("ghost", 1, 1.0, 0.0),
            Err(BanditError::UnknownArm { id: "ghost".into() })
        );
    }

    #[test]
    fn list_by_state_is_id_ordered() {
        let mut ledger = ArmLedger::new();
        for id in ["c", "a", "b"] {
            ledger.add_arm(id).unwrap();
        }
        ledger.set_state("b", ArmState::Dormant, 5);
        assert_eq!(ledger.list_by_state(ArmState::Active), vec!["a", "c"]);
        assert_eq!(ledger.list_by_state(ArmState::Dormant), vec!["b"]);
        assert_eq!(ledger.get("b").unwrap().dormant_since, Some(5));
    }

    #[test]
    fn removed_is_terminal() {
        let mut ledger = ArmLedger::new();
        ledger.add_arm("a").unwrap();
        ledger.set_state("a", ArmState::Removed, 3);
        ledger.set_state("a", ArmState::Active, 4);
        assert_eq!(ledger.get("a").unwrap().state, ArmState::Removed);
    }
}
