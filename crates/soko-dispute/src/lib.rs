//! # soko-dispute — Dispute Workflow
//!
//! Models the full lifecycle of a marketplace dispute between a buyer and
//! a seller over a completed order:
//!
//! - **Dispute** ([`dispute`]): the aggregate root and its state machine —
//!   opening, seller response, negotiation, escalation, admin decision,
//!   and closure.
//!
//! - **Evidence** ([`evidence`]): opaque references to externally stored
//!   proof material. The engine records locators; it never touches file
//!   contents.
//!
//! - **Timeline** ([`timeline`]): the append-only per-dispute message log
//!   that doubles as negotiation channel and audit trail.
//!
//! - **Policy** ([`policy`]): every tunable value — response and
//!   negotiation windows, minimum text lengths, evidence caps, reputation
//!   deltas, the refund retry cap.
//!
//! - **Events** ([`events`]): domain events emitted on each successful
//!   transition, consumed by an external notifier through [`EventSink`].

pub mod dispute;
pub mod error;
pub mod events;
pub mod evidence;
pub mod policy;
pub mod resolution;
pub mod timeline;

// Re-export primary types.
pub use dispute::{
    Dispute, DisputeState, EscalationTrigger, IssueCategory, OpenDisputeRequest, ProposingParty,
};
pub use error::DisputeError;
pub use events::{BufferEventSink, DisputeEvent, EventSink, NullEventSink};
pub use evidence::EvidenceRef;
pub use policy::DisputePolicy;
pub use resolution::{ProposalOutcome, ResolutionKind, ResolutionProposal};
pub use timeline::{ParticipantRole, Timeline, TimelineEntry};
