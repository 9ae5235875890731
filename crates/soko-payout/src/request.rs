//! # Disbursement Request Tracking
//!
//! The durable record of one refund owed to a buyer. A dispute has at most
//! one disbursement request; a failed request is retried under a fresh
//! attempt counter, never silently duplicated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Money, Msisdn, PayoutId, Timestamp};

use crate::gateway::PayoutError;

// ---------------------------------------------------------------------------
// IdempotencyKey
// ---------------------------------------------------------------------------

/// The deduplication key for one disbursement attempt.
///
/// Composed of the dispute identifier and a monotonically increasing
/// attempt counter. The string form (`dispute:<uuid>#<attempt>`) is what
/// crosses the wire to the gateway and comes back on callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey {
    /// The dispute the disbursement belongs to.
    pub dispute_id: DisputeId,
    /// The attempt counter, starting at 1.
    pub attempt: u32,
}

impl IdempotencyKey {
    /// Create a key for the given dispute and attempt.
    pub fn new(dispute_id: DisputeId, attempt: u32) -> Self {
        Self {
            dispute_id,
            attempt,
        }
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.dispute_id, self.attempt)
    }
}

// ---------------------------------------------------------------------------
// DisbursementStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a disbursement request.
///
/// Status machine: `Pending → Settled` or `Pending → Failed → Pending`
/// (retry) until the retry cap. `Settled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementStatus {
    /// Recorded and awaiting a terminal gateway outcome.
    Pending,
    /// The gateway confirmed the transfer. Terminal.
    Settled,
    /// The last attempt failed; eligible for retry below the cap.
    Failed,
}

impl DisbursementStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Settled => "settled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DisbursementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SettlementOutcome
// ---------------------------------------------------------------------------

/// What applying a settlement callback achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The callback changed the request state.
    Applied,
    /// The callback repeated an already-recorded outcome; nothing changed.
    Duplicate,
}

// ---------------------------------------------------------------------------
// DisbursementRequest
// ---------------------------------------------------------------------------

/// A tracked request to return money to a buyer.
///
/// Created in `Pending` before any gateway traffic. Outcome recording is
/// idempotent: re-delivering the outcome already on record is a
/// [`SettlementOutcome::Duplicate`] no-op, while a *conflicting* outcome
/// for the same attempt is an error that demands operator attention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisbursementRequest {
    /// Unique request identifier.
    pub id: PayoutId,
    /// The dispute this refund settles.
    pub dispute_id: DisputeId,
    /// The buyer's registered mobile-money wallet.
    pub recipient: Msisdn,
    /// The refund amount.
    pub amount: Money,
    /// Current status.
    pub status: DisbursementStatus,
    /// The attempt counter, starting at 1. Increments on retry.
    pub attempt: u32,
    /// The gateway's settlement reference, once known.
    pub external_ref: Option<String>,
    /// The most recent gateway error, if any.
    pub last_error: Option<String>,
    /// When the request was created.
    pub created_at: Timestamp,
    /// When the request last changed.
    pub updated_at: Timestamp,
}

impl DisbursementRequest {
    /// Record a new disbursement request in `Pending`.
    pub fn create(
        dispute_id: DisputeId,
        recipient: Msisdn,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        let now = Timestamp::from_datetime(now);
        Self {
            id: PayoutId::new(),
            dispute_id,
            recipient,
            amount,
            status: DisbursementStatus::Pending,
            attempt: 1,
            external_ref: None,
            last_error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The idempotency key of the current attempt.
    pub fn idempotency_key(&self) -> IdempotencyKey {
        IdempotencyKey::new(self.dispute_id, self.attempt)
    }

    /// Record that the gateway settled the transfer.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::ConflictingOutcome`] when the request has
    /// already failed — a settled-after-failed report for the same attempt
    /// means the gateway and the engine disagree about reality.
    pub fn record_settled(
        &mut self,
        external_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, PayoutError> {
        match self.status {
            DisbursementStatus::Settled => Ok(SettlementOutcome::Duplicate),
            DisbursementStatus::Pending => {
                self.status = DisbursementStatus::Settled;
                self.external_ref = Some(external_ref.into());
                self.last_error = None;
                self.updated_at = Timestamp::from_datetime(now);
                Ok(SettlementOutcome::Applied)
            }
            DisbursementStatus::Failed => Err(PayoutError::ConflictingOutcome {
                payout_id: self.id.to_string(),
                recorded: self.status.as_str().to_string(),
                reported: DisbursementStatus::Settled.as_str().to_string(),
            }),
        }
    }

    /// Record that the gateway failed the transfer.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::ConflictingOutcome`] when the request is
    /// already settled — money that moved cannot unfail.
    pub fn record_failed(
        &mut self,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, PayoutError> {
        match self.status {
            DisbursementStatus::Failed => Ok(SettlementOutcome::Duplicate),
            DisbursementStatus::Pending => {
                self.status = DisbursementStatus::Failed;
                self.last_error = Some(error.into());
                self.updated_at = Timestamp::from_datetime(now);
                Ok(SettlementOutcome::Applied)
            }
            DisbursementStatus::Settled => Err(PayoutError::ConflictingOutcome {
                payout_id: self.id.to_string(),
                recorded: self.status.as_str().to_string(),
                reported: DisbursementStatus::Failed.as_str().to_string(),
            }),
        }
    }

    /// Begin a fresh attempt after a failure.
    ///
    /// Increments the attempt counter — producing a new idempotency key —
    /// and returns the request to `Pending`. The previous error stays on
    /// record until the next outcome overwrites it.
    ///
    /// # Errors
    ///
    /// Returns [`PayoutError::NotRetriable`] unless the request is
    /// `Failed`.
    pub fn begin_retry(&mut self, now: DateTime<Utc>) -> Result<(), PayoutError> {
        if self.status != DisbursementStatus::Failed {
            return Err(PayoutError::NotRetriable {
                payout_id: self.id.to_string(),
                status: self.status.as_str().to_string(),
            });
        }
        self.attempt += 1;
        self.status = DisbursementStatus::Pending;
        self.updated_at = Timestamp::from_datetime(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn pending() -> DisbursementRequest {
        DisbursementRequest::create(
            DisputeId::new(),
            Msisdn::new("+254712345678").unwrap(),
            Money::new(2000, "KES").unwrap(),
            now(),
        )
    }

    #[test]
    fn create_starts_pending_attempt_one() {
        let request = pending();
        assert_eq!(request.status, DisbursementStatus::Pending);
        assert_eq!(request.attempt, 1);
        assert!(request.external_ref.is_none());
        assert_eq!(request.idempotency_key().attempt, 1);
    }

    #[test]
    fn idempotency_key_string_form() {
        let request = pending();
        let key = request.idempotency_key();
        assert_eq!(key.to_string(), format!("{}#1", request.dispute_id));
    }

    #[test]
    fn settle_records_reference() {
        let mut request = pending();
        let outcome = request.record_settled("MM-2026-00042", now()).unwrap();
        assert_eq!(outcome, SettlementOutcome::Applied);
        assert_eq!(request.status, DisbursementStatus::Settled);
        assert_eq!(request.external_ref.as_deref(), Some("MM-2026-00042"));
        assert!(request.status.is_terminal());
    }

    #[test]
    fn duplicate_settle_is_noop() {
        let mut request = pending();
        request.record_settled("MM-1", now()).unwrap();
        let outcome = request.record_settled("MM-1", now()).unwrap();
        assert_eq!(outcome, SettlementOutcome::Duplicate);
        assert_eq!(request.external_ref.as_deref(), Some("MM-1"));
    }

    #[test]
    fn fail_then_settle_conflicts() {
        let mut request = pending();
        request.record_failed("wallet suspended", now()).unwrap();
        let err = request.record_settled("MM-1", now());
        assert!(matches!(err, Err(PayoutError::ConflictingOutcome { .. })));
        assert_eq!(request.status, DisbursementStatus::Failed);
    }

    #[test]
    fn settle_then_fail_conflicts() {
        let mut request = pending();
        request.record_settled("MM-1", now()).unwrap();
        let err = request.record_failed("late failure report", now());
        assert!(matches!(err, Err(PayoutError::ConflictingOutcome { .. })));
        assert_eq!(request.status, DisbursementStatus::Settled);
    }

    #[test]
    fn duplicate_failure_is_noop() {
        let mut request = pending();
        request.record_failed("timeout", now()).unwrap();
        let outcome = request.record_failed("timeout", now()).unwrap();
        assert_eq!(outcome, SettlementOutcome::Duplicate);
    }

    #[test]
    fn retry_increments_attempt_and_key() {
        let mut request = pending();
        request.record_failed("timeout", now()).unwrap();
        request.begin_retry(now()).unwrap();

        assert_eq!(request.status, DisbursementStatus::Pending);
        assert_eq!(request.attempt, 2);
        assert_eq!(request.idempotency_key().attempt, 2);
        assert_eq!(request.last_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn retry_requires_failed() {
        let mut request = pending();
        assert!(matches!(
            request.begin_retry(now()),
            Err(PayoutError::NotRetriable { .. })
        ));

        request.record_settled("MM-1", now()).unwrap();
        assert!(request.begin_retry(now()).is_err());
        assert_eq!(request.attempt, 1);
    }

    #[test]
    fn settle_after_retry_clears_error() {
        let mut request = pending();
        request.record_failed("timeout", now()).unwrap();
        request.begin_retry(now()).unwrap();
        request.record_settled("MM-2", now()).unwrap();

        assert_eq!(request.status, DisbursementStatus::Settled);
        assert!(request.last_error.is_none());
        assert_eq!(request.attempt, 2);
    }

    #[test]
    fn request_serde_roundtrip() {
        let request = pending();
        let json = serde_json::to_string(&request).unwrap();
        let back: DisbursementRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, request.id);
        assert_eq!(back.status, DisbursementStatus::Pending);
        assert_eq!(back.amount, request.amount);
    }

    #[test]
    fn status_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&DisbursementStatus::Pending).unwrap(),
            "\"pending\""
        );
    }
}
