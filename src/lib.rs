//! `fallow`: deterministic decaying-UCB bandit engine with arm dormancy.
//!
//! Designed for repeated single-choice allocation: you have a small set of
//! arms (pricing tiers, creatives, routing targets — anything you choose
//! between once per round), an outcome with a reward and a cost arrives
//! after the fact, and arms that go unused lose standing. Arms whose
//! standing erodes are parked as **Dormant** and later reconsidered; arms
//! that never recover are **Removed** permanently.
//!
//! **Goals:**
//! - **Deterministic by default**: same ledger + config → same choice.
//!   Selection is UCB argmax with smallest-id tie-breaks; no RNG anywhere.
//! - **Non-stationarity aware**: an exponential decay term erodes the
//!   score of arms that have not been pulled recently, forcing the
//!   exploration bonus to re-test them before they are deactivated.
//! - **Audit-friendly**: every selection returns its full score table
//!   ([`UcbSelection`]) and every lifecycle move is a typed
//!   [`Transition`] with a [`TransitionReason`] — log the structs, no
//!   internal logging layer.
//! - **Small K**: designed for a handful of arms per engine, context-free.
//!
//! **Pieces:**
//! - [`ArmLedger`]: per-arm pulls, reward/cost sums, lifecycle state.
//!   Pure bookkeeping, keyed by arm id.
//! - [`decayed_score`]: mean reward times `exp(-rate * rounds_idle)`;
//!   pure function of ledger state, recomputed on demand.
//! - [`select_ucb`]: cold start (every arm tried once, smallest id first),
//!   then `decayed mean + c * sqrt(2 ln(round) / pulls)` argmax.
//! - [`evaluate_lifecycle`]: the Active/Dormant/Removed state machine,
//!   with a safety override that never empties the Active set.
//! - [`ProfitAccumulator`]: per-arm and global net profit plus the
//!   trailing-window trend the lifecycle policy consumes.
//! - [`BanditEngine`]: the orchestrator. One engine runs rounds strictly
//!   sequentially; `next_round()` → observe externally →
//!   `report_outcome()` completes the round atomically.
//!
//! **Round discipline:** a round either completes fully or never happened.
//! `next_round` with an outcome outstanding, `report_outcome` with none,
//! mismatched arm ids, and out-of-bounds outcomes are all typed errors
//! ([`BanditError`]) raised before any state mutation.
//!
//! **Concurrency:** an engine is a plain `Send` value with `&mut self`
//! methods. Share one engine only behind a mutex held across the full
//! select-through-report sequence; independent engines (one per campaign,
//! say) share nothing and run in parallel freely.
//!
//! **Persistence:** [`BanditEngine::snapshot`] emits the full ledger table
//! plus the trailing profit windows; [`BanditEngine::restore`] resumes a
//! decision stream deterministically. Enable the `serde` feature for
//! serialization derives on snapshots, configs, and reports.
//!
//! **Non-goals:** no contextual features, no stochastic policies, no
//! reward observation or storage backend, not a general RL framework.
//!
//! # Example
//!
//! ```rust
//! use fallow::{BanditEngine, EngineConfig};
//!
//! let mut engine = BanditEngine::new(EngineConfig::default());
//! engine.add_arm("control").unwrap();
//! engine.add_arm("variant").unwrap();
//!
//! for _ in 0..2 {
//!     let arm = engine.next_round().unwrap();
//!     // ... take the action, observe reward and cost ...
//!     let report = engine.report_outcome(&arm, 1.0, 0.2).unwrap();
//!     assert!(report.lifecycle.applied.is_empty());
//! }
//! assert!((engine.total_profit() - 1.6).abs() < 1e-9);
//! ```

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod ledger;
pub use ledger::*;

mod decay;
pub use decay::*;

mod ucb;
pub use ucb::*;

mod profit;
pub use profit::*;

mod lifecycle;
pub use lifecycle::*;

mod engine;
pub use engine::*;
