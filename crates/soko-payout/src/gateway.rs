//! # Payout Gateway Adapters
//!
//! Defines the [`PayoutGateway`] trait for mobile-money disbursement
//! integrations. Each adapter handles the specifics of one provider while
//! the engine stays provider-agnostic.
//!
//! The trait abstracts three operations: initiating a disbursement,
//! checking the status of a previously initiated one, and reporting the
//! provider's human-readable name.
//!
//! ## Idempotency Contract
//!
//! An adapter must never issue two distinct real-world transfers for the
//! same idempotency key. A retried request with an already-seen key either
//! no-ops or returns the previously recorded acknowledgement. The
//! [`MockGateway`] enforces this contract exactly so tests exercise the
//! same semantics production adapters must provide.
//!
//! ## Implementations
//!
//! | Adapter | Status | Description |
//! |---------|--------|-------------|
//! | [`MpesaB2cGateway`] | Stub | Safaricom M-Pesa B2C disbursement API |
//! | [`MockGateway`] | Test | In-memory, scriptable, idempotency-enforcing |
//!
//! Methods are synchronous: the real gateway is asynchronous end to end,
//! but the adapter call itself only submits the instruction; the terminal
//! outcome always arrives later through a settlement callback.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use soko_core::{DisputeId, Money, Msisdn};

use crate::request::IdempotencyKey;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors arising from disbursement operations.
///
/// Each variant carries enough context to diagnose the failure without
/// inspecting opaque strings.
#[derive(Error, Debug)]
pub enum PayoutError {
    /// The adapter has not been configured for the target environment.
    /// This is the expected return from stub adapters until production
    /// credentials are provisioned.
    #[error("payout gateway not configured: {0}")]
    NotConfigured(String),

    /// The gateway rejected the instruction (e.g., unregistered wallet,
    /// limit exceeded).
    #[error("disbursement rejected by {gateway}: {reason}")]
    Rejected {
        /// Which gateway rejected the instruction.
        gateway: String,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// Network or connectivity error reaching the gateway. The triggering
    /// workflow transition still commits; the dispatch is retried later.
    #[error("payout gateway network error: {0}")]
    Network(String),

    /// The referenced disbursement was not found at the gateway.
    #[error("disbursement not found: reference {reference} at gateway {gateway}")]
    NotFound {
        /// The gateway that was queried.
        gateway: String,
        /// The reference that was not found.
        reference: String,
    },

    /// A settlement callback reported an outcome that contradicts the
    /// recorded one for the same attempt.
    #[error(
        "conflicting outcome for {payout_id}: {recorded} already recorded, gateway reported {reported}"
    )]
    ConflictingOutcome {
        /// The disbursement request identifier.
        payout_id: String,
        /// The outcome already on record.
        recorded: String,
        /// The outcome the callback reported.
        reported: String,
    },

    /// A retry was requested for a request that is not in a retriable
    /// state.
    #[error("disbursement {payout_id} cannot retry from status {status}")]
    NotRetriable {
        /// The disbursement request identifier.
        payout_id: String,
        /// The current status.
        status: String,
    },

    /// A settlement callback referenced an idempotency key the engine has
    /// never issued.
    #[error("unknown idempotency key: {0}")]
    UnknownKey(String),
}

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A disbursement instruction submitted to a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisbursementInstruction {
    /// The dispute whose refund this settles.
    pub dispute_id: DisputeId,
    /// The buyer's registered mobile-money wallet.
    pub recipient: Msisdn,
    /// The refund amount.
    pub amount: Money,
    /// Deduplication key for this attempt.
    pub idempotency_key: IdempotencyKey,
}

/// The gateway's acknowledgement of an accepted instruction.
///
/// Acceptance is not settlement: the transfer is in flight and its
/// terminal outcome arrives later via callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayAck {
    /// Gateway-assigned transaction reference.
    pub external_ref: String,
    /// When the gateway accepted the instruction.
    pub accepted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over mobile-money disbursement providers.
///
/// ## Object Safety
///
/// The trait is object-safe (`Send + Sync`) so the engine can hold its
/// gateway as `Arc<dyn PayoutGateway>` and tests can swap in the mock.
pub trait PayoutGateway: Send + Sync {
    /// Human-readable name of the provider (e.g. "M-Pesa B2C").
    fn gateway_name(&self) -> &str;

    /// Submit a disbursement instruction.
    ///
    /// On success returns a [`GatewayAck`] whose `external_ref` identifies
    /// the in-flight transfer. Submitting an already-seen idempotency key
    /// must return the original acknowledgement without moving money
    /// again.
    ///
    /// # Errors
    ///
    /// [`PayoutError::NotConfigured`] for stub adapters; production
    /// adapters may return `Rejected` or `Network` depending on the
    /// failure mode.
    fn request_disbursement(
        &self,
        instruction: &DisbursementInstruction,
    ) -> Result<GatewayAck, PayoutError>;

    /// Query the acknowledgement previously returned for a reference.
    ///
    /// # Errors
    ///
    /// [`PayoutError::NotFound`] when the reference is unknown;
    /// [`PayoutError::NotConfigured`] for stub adapters.
    fn check_status(&self, external_ref: &str) -> Result<GatewayAck, PayoutError>;
}

// ---------------------------------------------------------------------------
// Stub: M-Pesa B2C
// ---------------------------------------------------------------------------

/// Safaricom M-Pesa B2C adapter.
///
/// M-Pesa B2C is the business-to-customer disbursement API used to pay
/// buyers back onto their mobile wallets. Result codes arrive on an
/// asynchronous result URL, which maps directly onto the engine's
/// settlement callback.
///
/// **Status: STUB** — awaiting Daraja production credentials and result
/// URL provisioning.
///
/// When implemented, this adapter will:
/// - Submit `B2C/v3/paymentrequest` instructions with the idempotency key
///   as `OriginatorConversationID`
/// - Map Daraja result codes onto settlement outcomes
/// - Surface `TransactionID` as the external settlement reference
pub struct MpesaB2cGateway;

impl PayoutGateway for MpesaB2cGateway {
    fn gateway_name(&self) -> &str {
        "M-Pesa B2C"
    }

    fn request_disbursement(
        &self,
        _instruction: &DisbursementInstruction,
    ) -> Result<GatewayAck, PayoutError> {
        Err(PayoutError::NotConfigured(
            "M-Pesa B2C adapter requires Daraja credentials and a registered result URL".into(),
        ))
    }

    fn check_status(&self, _external_ref: &str) -> Result<GatewayAck, PayoutError> {
        Err(PayoutError::NotConfigured(
            "M-Pesa B2C status query requires Daraja credentials".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Mock gateway
// ---------------------------------------------------------------------------

/// Scripted behavior for the [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockGatewayMode {
    /// Accept every new instruction.
    Accept,
    /// Reject every new instruction with the given reason.
    Reject(String),
    /// Simulate an unreachable gateway.
    Unavailable,
}

/// An in-memory gateway for tests and local development.
///
/// Enforces the idempotency contract for real: a repeated key returns the
/// acknowledgement recorded for its first submission, regardless of the
/// current mode, and the instruction log shows exactly one accepted
/// transfer per key.
pub struct MockGateway {
    mode: Mutex<MockGatewayMode>,
    acked: Mutex<HashMap<String, GatewayAck>>,
    accepted: Mutex<Vec<DisbursementInstruction>>,
    counter: Mutex<u64>,
}

impl MockGateway {
    /// Create a mock that accepts everything.
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(MockGatewayMode::Accept),
            acked: Mutex::new(HashMap::new()),
            accepted: Mutex::new(Vec::new()),
            counter: Mutex::new(0),
        }
    }

    /// Switch the scripted behavior for subsequent new instructions.
    pub fn set_mode(&self, mode: MockGatewayMode) {
        *self.mode.lock() = mode;
    }

    /// Every instruction the gateway accepted, in order. One entry per
    /// idempotency key — duplicates never reach this log.
    pub fn accepted_instructions(&self) -> Vec<DisbursementInstruction> {
        self.accepted.lock().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PayoutGateway for MockGateway {
    fn gateway_name(&self) -> &str {
        "mock"
    }

    fn request_disbursement(
        &self,
        instruction: &DisbursementInstruction,
    ) -> Result<GatewayAck, PayoutError> {
        let key = instruction.idempotency_key.to_string();

        // A seen key always answers with the recorded acknowledgement —
        // the transfer already happened once and must not happen again.
        if let Some(ack) = self.acked.lock().get(&key) {
            tracing::debug!(key = %key, "duplicate disbursement dispatch deduplicated");
            return Ok(ack.clone());
        }

        match &*self.mode.lock() {
            MockGatewayMode::Accept => {
                let mut counter = self.counter.lock();
                *counter += 1;
                let ack = GatewayAck {
                    external_ref: format!("MOCK-{:06}", *counter),
                    accepted_at: Utc::now(),
                };
                self.acked.lock().insert(key, ack.clone());
                self.accepted.lock().push(instruction.clone());
                Ok(ack)
            }
            MockGatewayMode::Reject(reason) => Err(PayoutError::Rejected {
                gateway: "mock".to_string(),
                reason: reason.clone(),
            }),
            MockGatewayMode::Unavailable => {
                Err(PayoutError::Network("mock gateway unavailable".to_string()))
            }
        }
    }

    fn check_status(&self, external_ref: &str) -> Result<GatewayAck, PayoutError> {
        self.acked
            .lock()
            .values()
            .find(|ack| ack.external_ref == external_ref)
            .cloned()
            .ok_or_else(|| PayoutError::NotFound {
                gateway: "mock".to_string(),
                reference: external_ref.to_string(),
            })
    }
}
