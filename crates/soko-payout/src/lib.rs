//! # soko-payout — Disbursement Dispatch
//!
//! The money-movement edge of the dispute engine. When a resolution
//! implies a refund, the engine records a [`DisbursementRequest`] and asks
//! a [`PayoutGateway`] to move the funds; the gateway's terminal outcome
//! arrives later as a settlement callback.
//!
//! Two guarantees anchor this crate:
//!
//! 1. **Idempotency.** Every dispatch carries an [`IdempotencyKey`]
//!    (dispute id + attempt counter). A gateway must never issue two
//!    real-world transfers for one key; a retried request with a seen key
//!    returns the previously recorded acknowledgement.
//!
//! 2. **Durable-record-first.** The request is recorded `Pending` before
//!    any gateway call. Gateway unavailability never loses or duplicates a
//!    refund — the request stays `Pending` with the error noted and is
//!    retried later.

pub mod gateway;
pub mod request;

pub use gateway::{
    DisbursementInstruction, GatewayAck, MockGateway, MockGatewayMode, MpesaB2cGateway,
    PayoutError, PayoutGateway,
};
pub use request::{DisbursementRequest, DisbursementStatus, IdempotencyKey, SettlementOutcome};
