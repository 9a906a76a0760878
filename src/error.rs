//! Typed errors for ledger, selection, and engine operations.
//!
//! All errors are synchronous and none are used for ordinary control flow:
//! cold start is an explicit branch in the selector, not an error path, and
//! lifecycle transitions are reported, not thrown.

/// Errors surfaced by [`ArmLedger`][crate::ArmLedger], the selector, and
/// [`BanditEngine`][crate::BanditEngine].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BanditError {
    /// An arm with this id already exists in the ledger.
    #[error("arm {id:?} already exists")]
    DuplicateArm { id: String },

    /// The referenced arm id is not in the ledger.
    #[error("unknown arm {id:?}")]
    UnknownArm { id: String },

    /// Selection was requested with zero Active arms.
    ///
    /// The caller must add or reactivate an arm before retrying; the
    /// lifecycle safety override exists to make this rare, not impossible
    /// (manual removal can still empty the Active set).
    #[error("no active arms to select from")]
    NoActiveArms,

    /// A reported reward or cost fell outside the configured bounds (or was
    /// not finite). Rejected before any state mutation.
    #[error("invalid outcome for arm {id:?}: reward={reward}, cost={cost}")]
    InvalidOutcome { id: String, reward: f64, cost: f64 },

    /// `next_round` (or a conflicting operation) was called while a
    /// selection is still awaiting its outcome.
    #[error("round in progress: arm {pending:?} is awaiting an outcome")]
    RoundInProgress { pending: String },

    /// `report_outcome` was called with no selection outstanding.
    #[error("no round in progress")]
    NoRoundInProgress,

    /// The reported arm is not the one the current round selected.
    #[error("outcome reported for {reported:?} but round selected {selected:?}")]
    OutcomeArmMismatch { selected: String, reported: String },
}
