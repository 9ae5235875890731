//! # Reputation Ledger
//!
//! Per-seller trust scores with an auditable delta history. The running
//! score is what the marketplace surfaces next to a seller; the history is
//! what an operator reads when a score is challenged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Timestamp, UserId};

/// The lower score bound.
pub const MIN_SCORE: u8 = 0;

/// The upper score bound. New sellers start here.
pub const MAX_SCORE: u8 = 100;

// ── Reasons ────────────────────────────────────────────────────────────

/// Why a reputation delta was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationReason {
    /// A buyer opened a dispute against the seller.
    DisputeOpened,
    /// An admin decision found against the seller.
    SellerAtFault,
    /// An admin rejected the buyer's claim; the seller is vindicated.
    SellerVindicated,
}

impl ReputationReason {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisputeOpened => "dispute_opened",
            Self::SellerAtFault => "seller_at_fault",
            Self::SellerVindicated => "seller_vindicated",
        }
    }
}

impl std::fmt::Display for ReputationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Delta record ───────────────────────────────────────────────────────

/// One applied reputation adjustment, retained for audit.
///
/// `requested` is the signed delta the caller asked for; `applied` is what
/// clamping allowed. A seller at 2 receiving −5 records
/// `requested: -5, applied: -2, score_after: 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationDelta {
    /// The signed delta requested by policy.
    pub requested: i32,
    /// The signed delta actually applied after clamping.
    pub applied: i32,
    /// The score after this delta.
    pub score_after: u8,
    /// Why the delta was applied.
    pub reason: ReputationReason,
    /// The dispute that caused it.
    pub dispute_id: DisputeId,
    /// When the delta was recorded.
    pub recorded_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SellerRecord {
    score: u8,
    history: Vec<ReputationDelta>,
}

// ── Ledger ─────────────────────────────────────────────────────────────

/// The reputation ledger for all sellers.
///
/// Sellers appear lazily on their first delta; an unknown seller reads as
/// the starting score with an empty history. No read operation mutates
/// state, and the history is never trimmed — reputation audits need the
/// full trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationLedger {
    sellers: HashMap<UserId, SellerRecord>,
    starting_score: u8,
}

impl ReputationLedger {
    /// Create a ledger where new sellers start at [`MAX_SCORE`].
    pub fn new() -> Self {
        Self::with_starting_score(MAX_SCORE)
    }

    /// Create a ledger with a custom starting score (clamped to bounds).
    pub fn with_starting_score(starting_score: u8) -> Self {
        Self {
            sellers: HashMap::new(),
            starting_score: starting_score.min(MAX_SCORE),
        }
    }

    /// The seller's current score.
    pub fn score(&self, seller: &UserId) -> u8 {
        self.sellers
            .get(seller)
            .map(|r| r.score)
            .unwrap_or(self.starting_score)
    }

    /// The seller's full delta history, oldest first.
    pub fn history(&self, seller: &UserId) -> &[ReputationDelta] {
        self.sellers
            .get(seller)
            .map(|r| r.history.as_slice())
            .unwrap_or(&[])
    }

    /// Apply a signed delta to a seller's score and return the new score.
    ///
    /// The sole mutator. The resulting score is clamped into
    /// `[`[`MIN_SCORE`]`, `[`MAX_SCORE`]`]`; the recorded history keeps
    /// both the requested and the effectively applied delta.
    pub fn apply_delta(
        &mut self,
        seller: &UserId,
        delta: i32,
        reason: ReputationReason,
        dispute_id: DisputeId,
        now: DateTime<Utc>,
    ) -> u8 {
        let starting = self.starting_score;
        let record = self.sellers.entry(*seller).or_insert_with(|| SellerRecord {
            score: starting,
            history: Vec::new(),
        });

        let before = record.score;
        let after = (i64::from(before) + i64::from(delta))
            .clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8;

        record.score = after;
        record.history.push(ReputationDelta {
            requested: delta,
            applied: i32::from(after) - i32::from(before),
            score_after: after,
            reason,
            dispute_id,
            recorded_at: Timestamp::from_datetime(now),
        });

        tracing::debug!(
            seller = %seller,
            delta,
            reason = %reason,
            score = after,
            "reputation delta applied"
        );
        after
    }

    /// Number of sellers with at least one recorded delta.
    pub fn tracked_sellers(&self) -> usize {
        self.sellers.len()
    }
}

impl Default for ReputationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn unknown_seller_reads_starting_score() {
        let ledger = ReputationLedger::new();
        let seller = UserId::new();
        assert_eq!(ledger.score(&seller), 100);
        assert!(ledger.history(&seller).is_empty());
        assert_eq!(ledger.tracked_sellers(), 0);
    }

    #[test]
    fn opening_penalty_scenario() {
        let mut ledger = ReputationLedger::new();
        let seller = UserId::new();
        let score = ledger.apply_delta(
            &seller,
            -5,
            ReputationReason::DisputeOpened,
            DisputeId::new(),
            now(),
        );
        assert_eq!(score, 95);
        assert_eq!(ledger.score(&seller), 95);
    }

    #[test]
    fn clamps_at_lower_bound() {
        let mut ledger = ReputationLedger::new();
        let seller = UserId::new();
        let score = ledger.apply_delta(
            &seller,
            -250,
            ReputationReason::SellerAtFault,
            DisputeId::new(),
            now(),
        );
        assert_eq!(score, 0);

        let delta = &ledger.history(&seller)[0];
        assert_eq!(delta.requested, -250);
        assert_eq!(delta.applied, -100);
        assert_eq!(delta.score_after, 0);
    }

    #[test]
    fn clamps_at_upper_bound() {
        let mut ledger = ReputationLedger::new();
        let seller = UserId::new();
        let score = ledger.apply_delta(
            &seller,
            5,
            ReputationReason::SellerVindicated,
            DisputeId::new(),
            now(),
        );
        assert_eq!(score, 100);
        assert_eq!(ledger.history(&seller)[0].applied, 0);
    }

    #[test]
    fn history_accumulates_in_order() {
        let mut ledger = ReputationLedger::new();
        let seller = UserId::new();
        let d1 = DisputeId::new();
        let d2 = DisputeId::new();

        ledger.apply_delta(&seller, -5, ReputationReason::DisputeOpened, d1, now());
        ledger.apply_delta(&seller, -15, ReputationReason::SellerAtFault, d1, now());
        ledger.apply_delta(&seller, 5, ReputationReason::SellerVindicated, d2, now());

        let history = ledger.history(&seller);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].dispute_id, d1);
        assert_eq!(history[2].dispute_id, d2);
        assert_eq!(ledger.score(&seller), 85);
    }

    #[test]
    fn sellers_are_independent() {
        let mut ledger = ReputationLedger::new();
        let a = UserId::new();
        let b = UserId::new();
        ledger.apply_delta(&a, -20, ReputationReason::SellerAtFault, DisputeId::new(), now());
        assert_eq!(ledger.score(&a), 80);
        assert_eq!(ledger.score(&b), 100);
    }

    #[test]
    fn custom_starting_score() {
        let mut ledger = ReputationLedger::with_starting_score(50);
        let seller = UserId::new();
        assert_eq!(ledger.score(&seller), 50);
        let score = ledger.apply_delta(
            &seller,
            10,
            ReputationReason::SellerVindicated,
            DisputeId::new(),
            now(),
        );
        assert_eq!(score, 60);
    }

    #[test]
    fn reads_do_not_create_records() {
        let ledger = ReputationLedger::new();
        let seller = UserId::new();
        let _ = ledger.score(&seller);
        let _ = ledger.history(&seller);
        assert_eq!(ledger.tracked_sellers(), 0);
    }

    #[test]
    fn ledger_serde_roundtrip() {
        let mut ledger = ReputationLedger::new();
        let seller = UserId::new();
        ledger.apply_delta(&seller, -5, ReputationReason::DisputeOpened, DisputeId::new(), now());

        let json = serde_json::to_string(&ledger).unwrap();
        let back: ReputationLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.score(&seller), 95);
        assert_eq!(back.history(&seller).len(), 1);
    }

    proptest! {
        #[test]
        fn score_always_in_bounds(deltas in proptest::collection::vec(-300i32..300, 0..50)) {
            let mut ledger = ReputationLedger::new();
            let seller = UserId::new();
            for delta in deltas {
                let score = ledger.apply_delta(
                    &seller,
                    delta,
                    ReputationReason::SellerAtFault,
                    DisputeId::new(),
                    now(),
                );
                prop_assert!(score <= MAX_SCORE);
            }
        }

        #[test]
        fn history_reconstructs_score(deltas in proptest::collection::vec(-50i32..50, 1..30)) {
            let mut ledger = ReputationLedger::new();
            let seller = UserId::new();
            for delta in &deltas {
                ledger.apply_delta(
                    &seller,
                    *delta,
                    ReputationReason::DisputeOpened,
                    DisputeId::new(),
                    now(),
                );
            }
            let replayed = ledger
                .history(&seller)
                .iter()
                .fold(i64::from(MAX_SCORE), |score, d| score + i64::from(d.applied));
            prop_assert_eq!(replayed, i64::from(ledger.score(&seller)));
        }
    }
}
