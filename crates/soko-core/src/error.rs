//! # Validation Error Hierarchy
//!
//! Structured validation errors for domain primitives and caller input,
//! built with `thiserror`. Each variant carries the rejected input and the
//! expected constraint so callers can correct the request without
//! inspecting logs.

use thiserror::Error;

/// Errors raised when caller-supplied input fails a domain constraint.
///
/// Validation failures are surfaced directly to the caller and are never
/// retried automatically — the input itself must change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("field \"{field}\" must not be empty")]
    EmptyField {
        /// The name of the offending field.
        field: &'static str,
    },

    /// A text field was shorter than the policy minimum.
    #[error("field \"{field}\" is {len} characters, minimum is {min}")]
    TextTooShort {
        /// The name of the offending field.
        field: &'static str,
        /// The supplied length in characters.
        len: usize,
        /// The policy minimum length.
        min: usize,
    },

    /// Currency code is not three uppercase ASCII letters (ISO 4217).
    #[error("invalid currency code: \"{0}\" (expected three uppercase letters)")]
    InvalidCurrency(String),

    /// A monetary amount was negative.
    #[error("monetary amount must not be negative, got {0}")]
    NegativeAmount(i64),

    /// A monetary amount was required to be strictly positive.
    #[error("monetary amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Two amounts that must share a currency did not.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// The currency of the reference amount.
        expected: String,
        /// The currency that was supplied.
        actual: String,
    },

    /// A refund amount exceeded the amount in dispute.
    #[error("amount {requested} {currency} exceeds the disputed amount {cap} {currency}")]
    AmountExceedsCap {
        /// The requested amount in minor units.
        requested: i64,
        /// The maximum permitted amount in minor units.
        cap: i64,
        /// The shared currency code.
        currency: String,
    },

    /// An amount was supplied for a resolution kind that does not carry one.
    #[error("resolution kind {kind} does not take an amount")]
    UnexpectedAmount {
        /// The canonical name of the resolution kind.
        kind: String,
    },

    /// A mobile-money payout identifier failed MSISDN format validation.
    #[error("invalid msisdn: \"{0}\" (expected 10-15 digits, optionally prefixed with '+')")]
    InvalidMsisdn(String),

    /// The buyer and seller of a dispute were the same user.
    #[error("buyer and seller must be distinct users")]
    BuyerIsSeller,

    /// A dispute was submitted without any evidence reference.
    #[error("at least one evidence reference is required")]
    NoEvidence,

    /// More evidence references were attached than the policy allows.
    #[error("{count} evidence references attached, submission cap is {cap}")]
    EvidenceCapExceeded {
        /// How many references were attached.
        count: usize,
        /// The policy cap per submission.
        cap: usize,
    },
}
