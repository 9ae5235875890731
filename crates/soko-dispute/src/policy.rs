//! # Dispute Policy
//!
//! Every tunable value of the workflow lives here: deadline windows,
//! minimum text lengths, the evidence cap, reputation deltas, the refund
//! retry cap, and the closure grace period. The struct deserializes from
//! configuration so an operator can adjust policy without a code change;
//! [`Default`] carries the production values.
//!
//! Reputation deltas are fixed constants rather than functions of the
//! disputed amount, which keeps the ledger's effect auditable and
//! predictable.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Tunable policy values for the dispute workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputePolicy {
    /// Hours the seller has to respond before auto-escalation. Default 168
    /// (7 days).
    pub response_window_hours: i64,
    /// Hours of negotiation, measured from the seller's response, before
    /// auto-escalation. Default 168 (7 days).
    pub negotiation_window_hours: i64,
    /// Hours after a non-refund resolution before the dispute is archived
    /// as closed. Default 72.
    pub close_grace_hours: i64,
    /// Minimum length of the dispute description, in characters.
    pub min_description_len: usize,
    /// Minimum length of the seller's response, in characters.
    pub min_response_len: usize,
    /// Minimum length of an admin decision's reasoning, in characters.
    pub min_reasoning_len: usize,
    /// Maximum evidence references per submission.
    pub max_evidence_per_submission: usize,
    /// Signed reputation delta applied to the seller when a dispute opens.
    pub opening_delta: i32,
    /// Signed reputation delta applied when an admin decision finds
    /// against the seller.
    pub fault_delta: i32,
    /// Signed reputation delta applied when an admin rejects the claim and
    /// the seller is vindicated.
    pub vindication_delta: i32,
    /// Maximum disbursement attempts before an operator alert is raised.
    pub refund_retry_cap: u32,
}

impl DisputePolicy {
    /// The seller response window as a duration.
    pub fn response_window(&self) -> Duration {
        Duration::hours(self.response_window_hours)
    }

    /// The negotiation window as a duration.
    pub fn negotiation_window(&self) -> Duration {
        Duration::hours(self.negotiation_window_hours)
    }

    /// The post-resolution closure grace as a duration.
    pub fn close_grace(&self) -> Duration {
        Duration::hours(self.close_grace_hours)
    }
}

impl Default for DisputePolicy {
    fn default() -> Self {
        Self {
            response_window_hours: 7 * 24,
            negotiation_window_hours: 7 * 24,
            close_grace_hours: 3 * 24,
            min_description_len: 20,
            min_response_len: 20,
            min_reasoning_len: 30,
            max_evidence_per_submission: 5,
            opening_delta: -5,
            fault_delta: -15,
            vindication_delta: 5,
            refund_retry_cap: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_are_seven_days() {
        let policy = DisputePolicy::default();
        assert_eq!(policy.response_window(), Duration::days(7));
        assert_eq!(policy.negotiation_window(), Duration::days(7));
        assert_eq!(policy.close_grace(), Duration::days(3));
    }

    #[test]
    fn default_deltas() {
        let policy = DisputePolicy::default();
        assert_eq!(policy.opening_delta, -5);
        assert_eq!(policy.fault_delta, -15);
        assert_eq!(policy.vindication_delta, 5);
        assert_eq!(policy.refund_retry_cap, 3);
    }

    #[test]
    fn deserializes_from_config() {
        let json = r#"{
            "response_window_hours": 48,
            "negotiation_window_hours": 96,
            "close_grace_hours": 24,
            "min_description_len": 10,
            "min_response_len": 10,
            "min_reasoning_len": 15,
            "max_evidence_per_submission": 3,
            "opening_delta": -2,
            "fault_delta": -10,
            "vindication_delta": 3,
            "refund_retry_cap": 5
        }"#;
        let policy: DisputePolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.response_window(), Duration::hours(48));
        assert_eq!(policy.max_evidence_per_submission, 3);
        assert_eq!(policy.refund_retry_cap, 5);
    }

    #[test]
    fn serde_roundtrip_default() {
        let policy = DisputePolicy::default();
        let json = serde_json::to_string(&policy).unwrap();
        let back: DisputePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
