//! # Engine Error Types
//!
//! The error surface callers of the engine see. Subsystem errors are
//! wrapped rather than flattened so a caller can distinguish a validation
//! problem (fix the input) from a transition conflict (re-fetch state and
//! reconsider) from an authorization failure (do not retry).

use thiserror::Error;

use soko_core::ValidationError;
use soko_dispute::DisputeError;
use soko_payout::PayoutError;

/// Errors returned by [`DisputeEngine`](crate::DisputeEngine) operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The dispute workflow rejected the operation. Includes invalid
    /// transitions (surface as a conflict; re-fetch before retrying) and
    /// terminal-state rejections.
    #[error(transparent)]
    Dispute(#[from] DisputeError),

    /// A disbursement operation failed.
    #[error(transparent)]
    Payout(#[from] PayoutError),

    /// Caller input failed validation. Never retried automatically.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The caller's identity or capability does not match what the
    /// operation requires. Logged for audit; never downgraded to a no-op.
    #[error("caller {caller} is not authorized for {operation}: {reason}")]
    Unauthorized {
        /// The caller's user identifier.
        caller: String,
        /// The operation that was attempted.
        operation: &'static str,
        /// Why authorization failed.
        reason: String,
    },

    /// No dispute exists under the given identifier.
    #[error("dispute not found: {0}")]
    DisputeNotFound(String),

    /// A settlement callback arrived for a dispute with no disbursement
    /// request on record.
    #[error("dispute {0} has no disbursement request")]
    NoDisbursement(String),

    /// A refund-implying resolution requires the buyer to have a
    /// registered payout account, and they do not.
    #[error("user {0} has no registered payout account")]
    MissingPayoutAccount(String),
}
