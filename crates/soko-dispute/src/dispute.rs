//! # Dispute Aggregate and State Machine
//!
//! The aggregate root of the workflow. A dispute is created only through
//! [`Dispute::open`] and mutated only through the transition methods here;
//! it is never deleted, only terminated into `Resolved`/`Closed`.
//!
//! ## Transitions
//!
//! ```text
//! AWAITING_SELLER_RESPONSE ─seller_respond()──▶ IN_NEGOTIATION
//!         │                                          │
//!         │ escalate(ResponseDeadline)               │ escalate(Manual |
//!         │                                          │   NegotiationDeadline)
//!         ▼                                          ▼
//!     ADMIN_REVIEW ◀────────────────────────────────┘
//!         │ admin_decide()        IN_NEGOTIATION ─propose convergence──▶
//!         ▼                                                            │
//!      RESOLVED ◀──────────────────────────────────────────────────────┘
//!         │ close()
//!         ▼
//!       CLOSED
//! ```
//!
//! Every guard runs before the first field write, so a rejected operation
//! leaves the aggregate exactly as it found it. Deadline checks take the
//! current time as a parameter; the aggregate never reads the clock
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Money, OrderId, Timestamp, UserId, ValidationError};

use crate::error::DisputeError;
use crate::evidence::EvidenceRef;
use crate::policy::DisputePolicy;
use crate::resolution::{ProposalOutcome, ResolutionKind, ResolutionProposal};

// ── Issue Category ─────────────────────────────────────────────────────

/// The fixed set of recognized dispute categories.
///
/// Categories are a closed enum rather than free text so that reporting
/// and routing never have to normalize caller-invented labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// The order never arrived.
    ProductNotReceived,
    /// The order arrived damaged.
    ProductDamaged,
    /// The delivered goods do not match the listing.
    NotAsDescribed,
    /// A different item was delivered.
    WrongItem,
    /// The goods arrived but fall short of the promised quality.
    QualityIssue,
    /// The buyer was charged incorrectly.
    BillingProblem,
    /// Anything the other categories do not cover.
    Other,
}

impl IssueCategory {
    /// All categories as a slice.
    pub fn all() -> &'static [IssueCategory] {
        &[
            Self::ProductNotReceived,
            Self::ProductDamaged,
            Self::NotAsDescribed,
            Self::WrongItem,
            Self::QualityIssue,
            Self::BillingProblem,
            Self::Other,
        ]
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductNotReceived => "product_not_received",
            Self::ProductDamaged => "product_damaged",
            Self::NotAsDescribed => "not_as_described",
            Self::WrongItem => "wrong_item",
            Self::QualityIssue => "quality_issue",
            Self::BillingProblem => "billing_problem",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Dispute State ──────────────────────────────────────────────────────

/// The lifecycle state of a dispute.
///
/// The transient `open` moment and the awaiting-response phase share
/// identical behavior, so they are collapsed into a single
/// `AwaitingSellerResponse` state: a dispute is awaiting the seller from
/// the instant it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeState {
    /// Waiting for the seller's first response.
    AwaitingSellerResponse,
    /// Both parties are negotiating a resolution.
    InNegotiation,
    /// A human admin arbitrates.
    AdminReview,
    /// A resolution is fixed; refund settlement may still be in flight.
    Resolved,
    /// Archived. Terminal state: no further mutation, timeline included.
    Closed,
}

impl DisputeState {
    /// Whether this state still accepts party/admin workflow operations.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Self::AwaitingSellerResponse | Self::InNegotiation | Self::AdminReview
        )
    }

    /// Whether this is the terminal archival state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// The canonical state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingSellerResponse => "AWAITING_SELLER_RESPONSE",
            Self::InNegotiation => "IN_NEGOTIATION",
            Self::AdminReview => "ADMIN_REVIEW",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for DisputeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Escalation Trigger ─────────────────────────────────────────────────

/// What drove a move to admin review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    /// Either party requested arbitration during negotiation.
    Manual,
    /// The seller never responded within the response window.
    ResponseDeadline,
    /// Negotiation ran past its window without convergence.
    NegotiationDeadline,
}

impl EscalationTrigger {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ResponseDeadline => "response_deadline",
            Self::NegotiationDeadline => "negotiation_deadline",
        }
    }
}

impl std::fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which negotiating party recorded a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposingParty {
    /// The dispute's buyer.
    Buyer,
    /// The dispute's seller.
    Seller,
}

// ── Open Request ───────────────────────────────────────────────────────

/// Everything a buyer supplies to open a dispute.
#[derive(Debug, Clone)]
pub struct OpenDisputeRequest {
    /// The order the dispute concerns.
    pub order_id: OrderId,
    /// The opening buyer.
    pub buyer: UserId,
    /// The seller of the order.
    pub seller: UserId,
    /// The issue category.
    pub category: IssueCategory,
    /// Short human-readable title.
    pub title: String,
    /// Full description of the problem. Doubles as the opening timeline
    /// message.
    pub description: String,
    /// The disputed amount in the transaction currency.
    pub amount: Money,
    /// Evidence references attached at opening. At least one is required.
    pub evidence: Vec<EvidenceRef>,
}

// ── Dispute ────────────────────────────────────────────────────────────

/// A dispute between a buyer and a seller over a completed order.
///
/// The disputed amount is immutable once set. The resolution kind stays
/// [`ResolutionKind::Undecided`] while the dispute is open and becomes
/// immutable the moment the state reaches `Resolved` — there is no method
/// that rewrites a fixed resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    /// Unique dispute identifier.
    pub id: DisputeId,
    /// The order under dispute.
    pub order_id: OrderId,
    /// The buyer who opened the dispute.
    pub buyer: UserId,
    /// The seller the dispute is against.
    pub seller: UserId,
    /// The issue category.
    pub category: IssueCategory,
    /// Short title.
    pub title: String,
    /// Full problem description.
    pub description: String,
    /// The disputed amount. Immutable.
    pub amount: Money,
    /// Current lifecycle state.
    pub state: DisputeState,
    /// Evidence references attached so far.
    pub evidence: Vec<EvidenceRef>,
    /// When the dispute was opened.
    pub opened_at: Timestamp,
    /// When the aggregate last changed.
    pub updated_at: Timestamp,
    /// When the seller first responded, if they have.
    pub seller_responded_at: Option<Timestamp>,
    /// When the resolution was fixed, if it has been.
    pub resolved_at: Option<Timestamp>,
    resolution: ResolutionKind,
    resolution_amount: Option<Money>,
    buyer_proposal: Option<ResolutionProposal>,
    seller_proposal: Option<ResolutionProposal>,
}

impl Dispute {
    /// Open a dispute against an order.
    ///
    /// The aggregate starts in `AwaitingSellerResponse` with an
    /// `Undecided` resolution.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] (wrapped) when the buyer and seller
    /// coincide, the title is blank, the description is shorter than the
    /// policy minimum, the amount is zero, or the evidence count is
    /// outside `1..=cap`.
    pub fn open(
        request: OpenDisputeRequest,
        policy: &DisputePolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, DisputeError> {
        if request.buyer == request.seller {
            return Err(ValidationError::BuyerIsSeller.into());
        }
        if request.title.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "title" }.into());
        }
        let description_len = request.description.chars().count();
        if description_len < policy.min_description_len {
            return Err(ValidationError::TextTooShort {
                field: "description",
                len: description_len,
                min: policy.min_description_len,
            }
            .into());
        }
        if request.amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount(0).into());
        }
        if request.evidence.is_empty() {
            return Err(ValidationError::NoEvidence.into());
        }
        if request.evidence.len() > policy.max_evidence_per_submission {
            return Err(ValidationError::EvidenceCapExceeded {
                count: request.evidence.len(),
                cap: policy.max_evidence_per_submission,
            }
            .into());
        }

        let now = Timestamp::from_datetime(now);
        Ok(Self {
            id: DisputeId::new(),
            order_id: request.order_id,
            buyer: request.buyer,
            seller: request.seller,
            category: request.category,
            title: request.title,
            description: request.description,
            amount: request.amount,
            state: DisputeState::AwaitingSellerResponse,
            evidence: request.evidence,
            opened_at: now.clone(),
            updated_at: now,
            seller_responded_at: None,
            resolved_at: None,
            resolution: ResolutionKind::Undecided,
            resolution_amount: None,
            buyer_proposal: None,
            seller_proposal: None,
        })
    }

    // ── Read accessors ─────────────────────────────────────────────

    /// The current resolution kind. `Undecided` while the dispute is open.
    pub fn resolution(&self) -> ResolutionKind {
        self.resolution
    }

    /// The decided amount, when the resolution carries one.
    pub fn resolution_amount(&self) -> Option<&Money> {
        self.resolution_amount.as_ref()
    }

    /// The buyer's standing proposal, if any.
    pub fn buyer_proposal(&self) -> Option<&ResolutionProposal> {
        self.buyer_proposal.as_ref()
    }

    /// The seller's standing proposal, if any.
    pub fn seller_proposal(&self) -> Option<&ResolutionProposal> {
        self.seller_proposal.as_ref()
    }

    /// The refund amount owed to the buyer, when the fixed resolution
    /// implies one.
    pub fn refund_due(&self) -> Option<&Money> {
        if self.resolution.implies_refund() {
            self.resolution_amount.as_ref()
        } else {
            None
        }
    }

    /// Age of the dispute at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.opened_at.elapsed(now)
    }

    /// The instant the response window expires.
    pub fn response_deadline(&self, policy: &DisputePolicy) -> DateTime<Utc> {
        *self.opened_at.as_datetime() + policy.response_window()
    }

    /// The instant the negotiation window expires, once the seller has
    /// responded.
    pub fn negotiation_deadline(&self, policy: &DisputePolicy) -> Option<DateTime<Utc>> {
        self.seller_responded_at
            .as_ref()
            .map(|t| *t.as_datetime() + policy.negotiation_window())
    }

    /// Whether the seller response window has elapsed without a response.
    ///
    /// The boundary is inclusive: at exactly the deadline the dispute is
    /// escalatable.
    pub fn is_response_overdue(&self, policy: &DisputePolicy, now: DateTime<Utc>) -> bool {
        self.state == DisputeState::AwaitingSellerResponse
            && now >= self.response_deadline(policy)
    }

    /// Whether negotiation has run past its window without convergence.
    pub fn is_negotiation_overdue(&self, policy: &DisputePolicy, now: DateTime<Utc>) -> bool {
        self.state == DisputeState::InNegotiation
            && self
                .negotiation_deadline(policy)
                .is_some_and(|deadline| now >= deadline)
    }

    // ── Transitions ────────────────────────────────────────────────

    /// The seller's first response. Transitions
    /// `AwaitingSellerResponse → InNegotiation`.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] outside
    /// `AwaitingSellerResponse`; a [`ValidationError`] when the response
    /// is shorter than the policy minimum.
    pub fn seller_respond(
        &mut self,
        response: &str,
        policy: &DisputePolicy,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        self.check_not_closed()?;
        if self.state != DisputeState::AwaitingSellerResponse {
            return Err(self.invalid(
                DisputeState::InNegotiation,
                "dispute is no longer awaiting the seller",
            ));
        }
        let response_len = response.chars().count();
        if response_len < policy.min_response_len {
            return Err(ValidationError::TextTooShort {
                field: "response",
                len: response_len,
                min: policy.min_response_len,
            }
            .into());
        }

        self.state = DisputeState::InNegotiation;
        self.seller_responded_at = Some(Timestamp::from_datetime(now));
        self.touch(now);
        Ok(())
    }

    /// Record one party's resolution proposal during negotiation.
    ///
    /// When the counterpart already holds an identical proposal the
    /// dispute resolves; otherwise the proposal is recorded and the state
    /// does not change. Conflicting proposals are not an error — the
    /// dispute simply stays `InNegotiation` until the parties converge or
    /// a deadline forces escalation.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] outside `InNegotiation`; a
    /// [`ValidationError`] when the proposal itself is malformed.
    pub fn propose_agreement(
        &mut self,
        party: ProposingParty,
        proposal: ResolutionProposal,
        now: DateTime<Utc>,
    ) -> Result<ProposalOutcome, DisputeError> {
        self.check_not_closed()?;
        if self.state != DisputeState::InNegotiation {
            return Err(self.invalid(DisputeState::Resolved, "proposals require active negotiation"));
        }

        let (kind, amount) = proposal.normalize(&self.amount)?;
        let normalized = ResolutionProposal {
            kind,
            amount: amount.clone(),
        };

        let counterpart = match party {
            ProposingParty::Buyer => {
                self.buyer_proposal = Some(normalized.clone());
                self.seller_proposal.as_ref()
            }
            ProposingParty::Seller => {
                self.seller_proposal = Some(normalized.clone());
                self.buyer_proposal.as_ref()
            }
        };

        let converged = counterpart == Some(&normalized);
        self.touch(now);
        if converged {
            self.fix_resolution(kind, amount.clone(), now);
            Ok(ProposalOutcome::Converged { kind, amount })
        } else {
            Ok(ProposalOutcome::Recorded)
        }
    }

    /// Move the dispute to admin review.
    ///
    /// Deadline triggers re-check both the state and the deadline, which
    /// makes the operation idempotent under a re-run sweep: the second
    /// attempt fails the state guard and changes nothing.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] when the trigger is not legal
    /// for the current state; [`DisputeError::DeadlineNotReached`] when a
    /// deadline trigger fires early.
    pub fn escalate(
        &mut self,
        trigger: EscalationTrigger,
        policy: &DisputePolicy,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        self.check_not_closed()?;
        match trigger {
            EscalationTrigger::Manual => {
                if self.state != DisputeState::InNegotiation {
                    return Err(self.invalid(
                        DisputeState::AdminReview,
                        "manual escalation requires active negotiation",
                    ));
                }
            }
            EscalationTrigger::ResponseDeadline => {
                if self.state != DisputeState::AwaitingSellerResponse {
                    return Err(self.invalid(
                        DisputeState::AdminReview,
                        "response deadline applies only while awaiting the seller",
                    ));
                }
                let deadline = self.response_deadline(policy);
                if now < deadline {
                    return Err(DisputeError::DeadlineNotReached {
                        dispute_id: self.id.to_string(),
                        deadline: deadline.to_rfc3339(),
                    });
                }
            }
            EscalationTrigger::NegotiationDeadline => {
                if self.state != DisputeState::InNegotiation {
                    return Err(self.invalid(
                        DisputeState::AdminReview,
                        "negotiation deadline applies only during negotiation",
                    ));
                }
                let deadline = self
                    .negotiation_deadline(policy)
                    .expect("InNegotiation implies a recorded seller response");
                if now < deadline {
                    return Err(DisputeError::DeadlineNotReached {
                        dispute_id: self.id.to_string(),
                        deadline: deadline.to_rfc3339(),
                    });
                }
            }
        }

        self.state = DisputeState::AdminReview;
        self.touch(now);
        Ok(())
    }

    /// An admin decision. Transitions `AdminReview → Resolved`.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] outside `AdminReview`; a
    /// [`ValidationError`] when the reasoning is too short or the amount
    /// violates the refund bound.
    pub fn admin_decide(
        &mut self,
        kind: ResolutionKind,
        amount: Option<Money>,
        reasoning: &str,
        policy: &DisputePolicy,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        self.check_not_closed()?;
        if self.state != DisputeState::AdminReview {
            return Err(self.invalid(DisputeState::Resolved, "decision requires admin review"));
        }
        let reasoning_len = reasoning.chars().count();
        if reasoning_len < policy.min_reasoning_len {
            return Err(ValidationError::TextTooShort {
                field: "reasoning",
                len: reasoning_len,
                min: policy.min_reasoning_len,
            }
            .into());
        }
        let (kind, amount) = ResolutionProposal { kind, amount }.normalize(&self.amount)?;

        self.fix_resolution(kind, amount, now);
        Ok(())
    }

    /// Archive a resolved dispute. Transitions `Resolved → Closed`.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] outside `Resolved`.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), DisputeError> {
        self.check_not_closed()?;
        if self.state != DisputeState::Resolved {
            return Err(self.invalid(DisputeState::Closed, "only resolved disputes can close"));
        }
        self.state = DisputeState::Closed;
        self.touch(now);
        Ok(())
    }

    /// Attach further evidence to an open dispute.
    ///
    /// # Errors
    ///
    /// [`DisputeError::InvalidTransition`] once the dispute has resolved.
    pub fn attach_evidence(
        &mut self,
        evidence: EvidenceRef,
        now: DateTime<Utc>,
    ) -> Result<(), DisputeError> {
        self.check_not_closed()?;
        if !self.state.is_open() {
            return Err(self.invalid(self.state, "evidence is fixed once the dispute resolves"));
        }
        self.evidence.push(evidence);
        self.touch(now);
        Ok(())
    }

    // ── Internal ───────────────────────────────────────────────────

    fn fix_resolution(&mut self, kind: ResolutionKind, amount: Option<Money>, now: DateTime<Utc>) {
        self.resolution = kind;
        self.resolution_amount = amount;
        self.resolved_at = Some(Timestamp::from_datetime(now));
        self.state = DisputeState::Resolved;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Timestamp::from_datetime(now);
    }

    fn check_not_closed(&self) -> Result<(), DisputeError> {
        if self.state.is_terminal() {
            return Err(DisputeError::TerminalState {
                dispute_id: self.id.to_string(),
                state: self.state.as_str().to_string(),
            });
        }
        Ok(())
    }

    fn invalid(&self, to: DisputeState, reason: &str) -> DisputeError {
        DisputeError::InvalidTransition {
            from: self.state.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: reason.to_string(),
        }
    }
}
