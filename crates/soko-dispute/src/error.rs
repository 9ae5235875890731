//! # Dispute Error Types
//!
//! Structured error hierarchy for the dispute workflow. Every variant
//! carries diagnostic context: the state at the time of failure, the
//! attempted transition, and actionable information for operators.

use thiserror::Error;

use soko_core::ValidationError;

/// Errors arising from dispute workflow operations.
///
/// State machine rejections include the current state, the attempted
/// target state, and the rejection reason. A rejected operation never
/// mutates the aggregate.
#[derive(Error, Debug)]
pub enum DisputeError {
    /// Attempted state transition is not valid from the current state.
    #[error("invalid dispute transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The current state name.
        from: String,
        /// The attempted target state name.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// Dispute is in a terminal state and cannot accept further mutation,
    /// including timeline appends.
    #[error("dispute {dispute_id} is in terminal state {state}")]
    TerminalState {
        /// The dispute identifier.
        dispute_id: String,
        /// The terminal state name.
        state: String,
    },

    /// A deadline-driven escalation was attempted before the relevant
    /// window elapsed.
    #[error("dispute {dispute_id} deadline has not elapsed (due {deadline})")]
    DeadlineNotReached {
        /// The dispute identifier.
        dispute_id: String,
        /// The deadline that has not yet passed (ISO 8601).
        deadline: String,
    },

    /// Caller-supplied input failed a domain constraint.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_display() {
        let err = DisputeError::InvalidTransition {
            from: "RESOLVED".to_string(),
            to: "IN_NEGOTIATION".to_string(),
            reason: "resolution is final".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("RESOLVED"));
        assert!(msg.contains("IN_NEGOTIATION"));
        assert!(msg.contains("resolution is final"));
    }

    #[test]
    fn terminal_state_display() {
        let err = DisputeError::TerminalState {
            dispute_id: "dispute:0000".to_string(),
            state: "CLOSED".to_string(),
        };
        assert!(format!("{err}").contains("dispute:0000"));
        assert!(format!("{err}").contains("CLOSED"));
    }

    #[test]
    fn deadline_not_reached_display() {
        let err = DisputeError::DeadlineNotReached {
            dispute_id: "dispute:0000".to_string(),
            deadline: "2026-08-08T00:00:00Z".to_string(),
        };
        assert!(format!("{err}").contains("2026-08-08"));
    }

    #[test]
    fn validation_error_wraps() {
        let err: DisputeError = ValidationError::NoEvidence.into();
        assert!(format!("{err}").contains("evidence"));
    }
}
