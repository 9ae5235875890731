//! Transition-matrix tests for the dispute state machine.
//!
//! Drives the aggregate directly (no engine) through every state and
//! checks that each operation is accepted exactly where the lifecycle
//! table says it is, that rejected operations leave the aggregate
//! untouched, and that the resolution invariants hold in every state.

use chrono::{DateTime, Duration, Utc};

use soko_core::{Money, OrderId, Timestamp, UserId};
use soko_dispute::{
    Dispute, DisputeError, DisputePolicy, DisputeState, EscalationTrigger, EvidenceRef,
    IssueCategory, OpenDisputeRequest, ProposingParty, ResolutionKind, ResolutionProposal,
};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn policy() -> DisputePolicy {
    DisputePolicy::default()
}

fn open_dispute() -> Dispute {
    let buyer = UserId::new();
    Dispute::open(
        OpenDisputeRequest {
            order_id: OrderId::new(),
            buyer,
            seller: UserId::new(),
            category: IssueCategory::NotAsDescribed,
            title: "Jacket color mismatch".to_string(),
            description: "The delivered jacket is green, the listing clearly showed navy."
                .to_string(),
            amount: Money::new(3500, "KES").unwrap(),
            evidence: vec![EvidenceRef::new(
                "s3://soko-evidence/jacket.jpg",
                "image/jpeg",
                2048,
                buyer,
                Timestamp::from_datetime(t0()),
            )
            .unwrap()],
        },
        &policy(),
        t0(),
    )
    .unwrap()
}

/// Build a dispute in each of the five lifecycle states.
fn in_state(state: DisputeState) -> Dispute {
    let mut dispute = open_dispute();
    let p = policy();
    match state {
        DisputeState::AwaitingSellerResponse => {}
        DisputeState::InNegotiation => {
            dispute
                .seller_respond("The supplier mislabelled that batch, sorry.", &p, t0())
                .unwrap();
        }
        DisputeState::AdminReview => {
            dispute
                .escalate(EscalationTrigger::ResponseDeadline, &p, t0() + Duration::days(8))
                .unwrap();
        }
        DisputeState::Resolved | DisputeState::Closed => {
            dispute
                .escalate(EscalationTrigger::ResponseDeadline, &p, t0() + Duration::days(8))
                .unwrap();
            dispute
                .admin_decide(
                    ResolutionKind::Rejected,
                    None,
                    "Photographic evidence does not support the color claim.",
                    &p,
                    t0() + Duration::days(9),
                )
                .unwrap();
            if state == DisputeState::Closed {
                dispute.close(t0() + Duration::days(12)).unwrap();
            }
        }
    }
    assert_eq!(dispute.state, state);
    dispute
}

const ALL_STATES: [DisputeState; 5] = [
    DisputeState::AwaitingSellerResponse,
    DisputeState::InNegotiation,
    DisputeState::AdminReview,
    DisputeState::Resolved,
    DisputeState::Closed,
];

// ---------------------------------------------------------------------------
// Acceptance matrix
// ---------------------------------------------------------------------------

#[test]
fn seller_respond_only_from_awaiting() {
    for state in ALL_STATES {
        let mut dispute = in_state(state);
        let result = dispute.seller_respond(
            "A response of more than twenty characters.",
            &policy(),
            t0() + Duration::days(20),
        );
        assert_eq!(
            result.is_ok(),
            state == DisputeState::AwaitingSellerResponse,
            "seller_respond acceptance wrong in {state}"
        );
    }
}

#[test]
fn propose_only_in_negotiation() {
    for state in ALL_STATES {
        let mut dispute = in_state(state);
        let result = dispute.propose_agreement(
            ProposingParty::Buyer,
            ResolutionProposal {
                kind: ResolutionKind::Replacement,
                amount: None,
            },
            t0() + Duration::days(20),
        );
        assert_eq!(
            result.is_ok(),
            state == DisputeState::InNegotiation,
            "propose_agreement acceptance wrong in {state}"
        );
    }
}

#[test]
fn manual_escalation_only_in_negotiation() {
    for state in ALL_STATES {
        let mut dispute = in_state(state);
        let result = dispute.escalate(
            EscalationTrigger::Manual,
            &policy(),
            t0() + Duration::days(20),
        );
        assert_eq!(
            result.is_ok(),
            state == DisputeState::InNegotiation,
            "manual escalation acceptance wrong in {state}"
        );
    }
}

#[test]
fn admin_decide_only_in_admin_review() {
    for state in ALL_STATES {
        let mut dispute = in_state(state);
        let result = dispute.admin_decide(
            ResolutionKind::Rejected,
            None,
            "A decision rationale comfortably over the minimum length.",
            &policy(),
            t0() + Duration::days(20),
        );
        assert_eq!(
            result.is_ok(),
            state == DisputeState::AdminReview,
            "admin_decide acceptance wrong in {state}"
        );
    }
}

#[test]
fn close_only_from_resolved() {
    for state in ALL_STATES {
        let mut dispute = in_state(state);
        let result = dispute.close(t0() + Duration::days(20));
        assert_eq!(
            result.is_ok(),
            state == DisputeState::Resolved,
            "close acceptance wrong in {state}"
        );
    }
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn resolution_undecided_exactly_while_open() {
    for state in ALL_STATES {
        let dispute = in_state(state);
        if state.is_open() {
            assert_eq!(
                dispute.resolution(),
                ResolutionKind::Undecided,
                "open state {state} must be undecided"
            );
            assert!(dispute.resolution_amount().is_none());
            assert!(dispute.resolved_at.is_none());
        } else {
            assert_ne!(
                dispute.resolution(),
                ResolutionKind::Undecided,
                "settled state {state} must carry a resolution"
            );
            assert!(dispute.resolved_at.is_some());
        }
    }
}

#[test]
fn rejected_operations_never_mutate() {
    for state in ALL_STATES {
        let reference = in_state(state);
        let mut dispute = in_state(state);
        // Fire an operation that is illegal in this state.
        let result = match state {
            DisputeState::AwaitingSellerResponse => dispute
                .admin_decide(
                    ResolutionKind::Rejected,
                    None,
                    "Illegal decision attempt from the wrong lifecycle state.",
                    &policy(),
                    t0() + Duration::days(20),
                )
                .err(),
            _ => dispute
                .seller_respond(
                    "An illegal response from the wrong lifecycle state.",
                    &policy(),
                    t0() + Duration::days(20),
                )
                .err(),
        };
        assert!(result.is_some(), "operation unexpectedly legal in {state}");
        assert_eq!(dispute.state, reference.state);
        assert_eq!(dispute.resolution(), reference.resolution());
        assert_eq!(dispute.updated_at, reference.updated_at);
    }
}

#[test]
fn terminal_state_reports_terminal_error() {
    let mut dispute = in_state(DisputeState::Closed);
    let err = dispute
        .seller_respond(
            "Writing into a closed dispute must fail loudly.",
            &policy(),
            t0() + Duration::days(30),
        )
        .unwrap_err();
    assert!(matches!(err, DisputeError::TerminalState { .. }));
}

#[test]
fn deadline_monotonicity_around_the_boundary() {
    let p = policy();
    let dispute = open_dispute();
    let deadline = dispute.response_deadline(&p);

    // Escalatable at T+7d and T+7d+ε, not at T+7d−ε.
    for (offset, expected) in [
        (Duration::seconds(-1), false),
        (Duration::zero(), true),
        (Duration::seconds(1), true),
        (Duration::days(30), true),
    ] {
        let mut probe = open_dispute();
        // Recreate at the same instant so the deadline matches.
        assert_eq!(probe.response_deadline(&p), deadline);
        let result = probe.escalate(EscalationTrigger::ResponseDeadline, &p, deadline + offset);
        assert_eq!(
            result.is_ok(),
            expected,
            "escalation at deadline{offset} should be {expected}"
        );
    }
}

#[test]
fn refund_amount_never_exceeds_dispute_amount() {
    let p = policy();
    let mut dispute = in_state(DisputeState::AdminReview);

    let over = dispute.admin_decide(
        ResolutionKind::PartialRefund,
        Some(Money::new(3501, "KES").unwrap()),
        "Attempting to refund more than is in dispute must fail.",
        &p,
        t0() + Duration::days(9),
    );
    assert!(over.is_err());
    assert_eq!(dispute.resolution(), ResolutionKind::Undecided);

    dispute
        .admin_decide(
            ResolutionKind::PartialRefund,
            Some(Money::new(3500, "KES").unwrap()),
            "Refunding exactly the disputed amount is the permitted maximum.",
            &p,
            t0() + Duration::days(9),
        )
        .unwrap();
    assert_eq!(
        dispute.resolution_amount(),
        Some(&Money::new(3500, "KES").unwrap())
    );
}

#[test]
fn second_seller_response_is_invalid_transition_every_time() {
    let p = policy();
    let mut dispute = open_dispute();
    dispute
        .seller_respond("The first response, well over the minimum.", &p, t0())
        .unwrap();

    for _ in 0..3 {
        let err = dispute
            .seller_respond("A repeat response that must be rejected.", &p, t0())
            .unwrap_err();
        assert!(matches!(err, DisputeError::InvalidTransition { .. }));
        assert_eq!(dispute.state, DisputeState::InNegotiation);
    }
}
