//! Deterministic UCB selection over the eligible arm set.
//!
//! Policy:
//! - Cold start: while any eligible arm is unpulled, pick the smallest-id
//!   unpulled arm — every arm is tried once before exploitation begins.
//! - Otherwise score each arm as decayed mean plus the UCB exploration
//!   radius and take the argmax, ties to the smallest id.
//!
//! Same ledger + same config → same choice; there is no RNG anywhere in
//! this path. Each selection returns an explain envelope with the full
//! per-arm score table so callers can log or replay the decision.

use crate::{decayed_score, ArmLedger, BanditError};

/// Per-arm scoring row for one selection (audit/logging).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UcbCandidate {
    /// Arm id.
    pub arm: String,
    /// Pull count at selection time.
    pub pulls: u64,
    /// Mean observed reward, or `None` if never pulled.
    pub mean_reward: Option<f64>,
    /// Decay-adjusted mean, or `None` if never pulled.
    pub decayed: Option<f64>,
    /// Exploration radius `c * sqrt(2 ln(round) / pulls)` (0 if unpulled).
    pub bonus: f64,
    /// Total score used for the argmax, or `None` for cold-start arms.
    pub score: Option<f64>,
}

/// One selection decision with its full score table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UcbSelection {
    /// The selected arm.
    pub chosen: String,
    /// The round index this selection is for (1-based).
    pub round: u64,
    /// Whether the cold-start branch made the choice.
    pub cold_start: bool,
    /// Scoring rows for every eligible arm, in id order.
    pub candidates: Vec<UcbCandidate>,
}

/// Exploration radius for an arm with `pulls > 0` at `round`.
#[must_use]
pub fn exploration_bonus(round: u64, pulls: u64, exploration_constant: f64) -> f64 {
    if pulls == 0 {
        return 0.0;
    }
    let r = round.max(1) as f64;
    exploration_constant * (2.0 * r.ln() / pulls as f64).sqrt()
}

/// Select one arm from `eligible` for the given (1-based) `round`.
///
/// `eligible` is the Active set as provided by the lifecycle policy; every
/// id must exist in the ledger. Fails with
/// [`BanditError::NoActiveArms`] when `eligible` is empty.
pub fn select_ucb(
    eligible: &[String],
    ledger: &ArmLedger,
    round: u64,
    exploration_constant: f64,
    decay_rate: f64,
) -> Result<UcbSelection, BanditError> {
    if eligible.is_empty() {
        return Err(BanditError::NoActiveArms);
    }

    let mut ids: Vec<&String> = eligible.iter().collect();
    ids.sort();
    ids.dedup();

    let mut candidates = Vec::with_capacity(ids.len());
    for id in &ids {
        let arm = ledger
            .get(id)
            .ok_or_else(|| BanditError::UnknownArm { id: (*id).clone() })?;
        let decayed = decayed_score(arm, round, decay_rate);
        let bonus = exploration_bonus(round, arm.pulls, exploration_constant);
        candidates.push(UcbCandidate {
            arm: (*id).clone(),
            pulls: arm.pulls,
            mean_reward: arm.mean_reward(),
            decayed,
            bonus,
            score: decayed.map(|d| d + bonus),
        });
    }

    // Cold start: smallest-id unpulled arm wins outright.
    if let Some(cold) = candidates.iter().find(|c| c.pulls == 0) {
        return Ok(UcbSelection {
            chosen: cold.arm.clone(),
            round,
            cold_start: true,
            candidates,
        });
    }

    // Argmax over total score; candidates are in id order, so a strictly-
    // greater comparison breaks ties toward the smallest id.
    let mut best: Option<(&UcbCandidate, f64)> = None;
    for c in &candidates {
        let score = c.score.unwrap_or(f64::NEG_INFINITY);
        match best {
            Some((_, top)) if score.total_cmp(&top).is_le() => {}
            _ => best = Some((c, score)),
        }
    }
    let chosen = best
        .map(|(c, _)| c.arm.clone())
        .ok_or(BanditError::NoActiveArms)?;

    Ok(UcbSelection {
        chosen,
        round,
        cold_start: false,
        candidates,
    })
}
