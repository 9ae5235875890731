//! # soko-reputation — Seller Reputation Ledger
//!
//! A bounded numeric trust score per seller, adjusted by dispute outcomes.
//! [`ReputationLedger::apply_delta`] is the only mutator; every applied
//! delta is recorded in an append-only history so the running score is
//! always reconstructible for audit.
//!
//! Deltas are fixed policy constants, not functions of the disputed
//! amount — the ledger's effect stays predictable and auditable. Scores
//! clamp into `[0, 100]`; the history records both the requested delta and
//! the clamped amount actually applied.

pub mod ledger;

pub use ledger::{ReputationDelta, ReputationLedger, ReputationReason, MAX_SCORE, MIN_SCORE};
