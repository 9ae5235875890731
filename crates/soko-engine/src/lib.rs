//! # soko-engine — The Dispute Engine
//!
//! The caller-facing surface of the dispute workflow. The surrounding
//! application authenticates a user, builds a [`Caller`], and invokes the
//! operations on [`DisputeEngine`]; the engine enforces the role each
//! operation implies, serializes all work on one dispute behind that
//! dispute's own lock, and emits a domain event for every committed
//! transition.
//!
//! ## Concurrency model
//!
//! One logical actor per dispute: a per-aggregate `Mutex` serializes
//! concurrent transitions on the same dispute, while transitions on
//! different disputes proceed in parallel. The store-level lock guards
//! only map membership and is never held across a transition. The
//! deadline sweep acquires one dispute's lock at a time, so a stuck
//! dispute cannot stall the sweep of others.
//!
//! ## Time
//!
//! Every operation takes `now` as a parameter. The engine never reads the
//! clock, which makes deadline boundaries and scenario tests exactly
//! reproducible.

pub mod auth;
pub mod engine;
pub mod error;
pub mod sweeper;
pub mod view;

mod store;

pub use auth::{Caller, Capability};
pub use engine::{DisputeEngine, SettlementNotice};
pub use error::EngineError;
pub use sweeper::SweepReport;
pub use view::{DisputeSummary, DisputeView, Page};
