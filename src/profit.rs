//! Net profit accounting and the trailing trend signal.
//!
//! Each reported outcome contributes `net = reward - cost` to a per-arm
//! running total, a bounded per-arm trailing window (oldest evicted), and
//! the global total. The lifecycle policy consumes the trailing window as
//! its "is this arm trending negative?" signal.
//!
//! The trend is deliberately conservative: until an arm has a full window
//! of observations it reports [`Trend::Neutral`] — insufficient data never
//! counts against an arm.

use std::collections::{BTreeMap, VecDeque};

/// Trailing-window profit trend for one arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trend {
    /// Fewer than `window` observations; treated as not negative.
    Neutral,
    /// Full window and its sum is `< 0`.
    Negative,
    /// Full window and its sum is `>= 0`.
    NonNegative,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct ArmProfit {
    total: f64,
    trailing: VecDeque<f64>,
}

/// Per-arm and global net-profit accumulator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfitAccumulator {
    window: usize,
    arms: BTreeMap<String, ArmProfit>,
    total: f64,
}

impl ProfitAccumulator {
    /// Create an accumulator with trailing-window capacity `window`
    /// (minimum 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            arms: BTreeMap::new(),
            total: 0.0,
        }
    }

    /// Trailing-window capacity.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Record one outcome for `arm`, returning the net profit.
    pub fn record_outcome(&mut self, arm: &str, reward: f64, cost: f64) -> f64 {
        let net = reward - cost;
        let entry = self.arms.entry(arm.to_string()).or_default();
        entry.total += net;
        if entry.trailing.len() == self.window {
            entry.trailing.pop_front();
        }
        entry.trailing.push_back(net);
        self.total += net;
        net
    }

    /// Global cumulative net profit over all recorded outcomes.
    pub fn total_profit(&self) -> f64 {
        self.total
    }

    /// Cumulative net profit for `arm` (0 if it has no outcomes).
    pub fn arm_profit(&self, arm: &str) -> f64 {
        self.arms.get(arm).map(|a| a.total).unwrap_or(0.0)
    }

    /// Sum of the trailing window for `arm`, or `None` with no outcomes.
    pub fn trailing_sum(&self, arm: &str) -> Option<f64> {
        self.arms.get(arm).map(|a| a.trailing.iter().sum())
    }

    /// Trailing trend for `arm`. Neutral until the window is full.
    pub fn trend(&self, arm: &str) -> Trend {
        match self.arms.get(arm) {
            Some(a) if a.trailing.len() >= self.window => {
                let sum: f64 = a.trailing.iter().sum();
                if sum < 0.0 {
                    Trend::Negative
                } else {
                    Trend::NonNegative
                }
            }
            _ => Trend::Neutral,
        }
    }

    pub(crate) fn restore_arm(&mut self, arm: &str, total: f64, trailing: &[f64]) {
        let mut buf: VecDeque<f64> = trailing.iter().copied().collect();
        while buf.len() > self.window {
            buf.pop_front();
        }
        self.total += total;
        self.arms.insert(
            arm.to_string(),
            ArmProfit {
                total,
                trailing: buf,
            },
        );
    }

    pub(crate) fn trailing(&self, arm: &str) -> Vec<f64> {
        self.arms
            .get(arm)
            .map(|a| a.trailing.iter().copied().collect())
            .unwrap_or_default()
    }
}
