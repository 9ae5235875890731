#![deny(missing_docs)]

//! # soko-core — Foundational Types for the Soko Dispute Engine
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `thiserror`,
//! `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass an [`OrderId`] where a [`DisputeId`] is
//!    expected, and a raw `Uuid` never crosses a module boundary.
//!
//! 2. **Money is integer minor units.** All monetary amounts are `i64`
//!    counts of the smallest currency unit (cents, ngwee). Floats never
//!    appear in financial values.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] wraps `chrono::DateTime<Utc>`;
//!    local-time conversion is a presentation concern for callers.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use identity::{DisputeId, Msisdn, OrderId, PayoutId, UserId};
pub use money::Money;
pub use temporal::Timestamp;
