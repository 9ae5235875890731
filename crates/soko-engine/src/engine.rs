//! # Dispute Engine Operations
//!
//! The capability-checked operation set from the engine's public surface.
//! Each operation:
//!
//! 1. resolves the caller's role against the dispute and denies mismatches
//!    centrally (no per-call-site ad hoc checks),
//! 2. runs every guard before the first write, under the dispute's lock,
//!    so a rejected operation is invisible and a committed one is atomic
//!    (state + timeline entry + side-effect record together),
//! 3. emits exactly one domain event per committed transition.
//!
//! Refund dispatch is fire-and-forget-with-durable-record: the
//! [`DisbursementRequest`] is recorded `Pending` first, the gateway call
//! happens after, and a gateway error downgrades to a recorded failed
//! attempt — never to a lost refund or a rolled-back decision.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Money, Msisdn, Timestamp, UserId};
use soko_dispute::{
    Dispute, DisputeEvent, DisputePolicy, EscalationTrigger, EventSink, EvidenceRef,
    OpenDisputeRequest, ParticipantRole, ProposalOutcome, ProposingParty, ResolutionKind,
    ResolutionProposal, TimelineEntry,
};
use soko_payout::{
    DisbursementInstruction, DisbursementRequest, DisbursementStatus, IdempotencyKey,
    PayoutError, PayoutGateway, SettlementOutcome,
};
use soko_reputation::{ReputationLedger, ReputationReason};

use crate::auth::Caller;
use crate::error::EngineError;
use crate::store::{DisputeRecord, DisputeStore};
use crate::view::{DisputeSummary, DisputeView, Page};

// ---------------------------------------------------------------------------
// SettlementNotice
// ---------------------------------------------------------------------------

/// A terminal outcome reported by the disbursement gateway.
///
/// Delivery is at-least-once: the engine deduplicates by the idempotency
/// key, so replays are answered with the originally recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementNotice {
    /// The transfer settled.
    Settled {
        /// The gateway's final settlement reference.
        external_ref: String,
    },
    /// The transfer failed terminally at the gateway.
    Failed {
        /// The gateway's failure reason.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// DisputeEngine
// ---------------------------------------------------------------------------

/// The dispute resolution engine.
///
/// Holds the dispute store, the reputation ledger, the payout account
/// directory, the disbursement gateway, and the event sink. All state
/// lives behind locks; the engine itself is shared as `&self` across
/// threads.
pub struct DisputeEngine {
    policy: DisputePolicy,
    store: DisputeStore,
    reputation: Mutex<ReputationLedger>,
    payout_accounts: RwLock<HashMap<UserId, Msisdn>>,
    gateway: Arc<dyn PayoutGateway>,
    sink: Arc<dyn EventSink>,
}

impl DisputeEngine {
    /// Create an engine with the default policy.
    pub fn new(gateway: Arc<dyn PayoutGateway>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_policy(DisputePolicy::default(), gateway, sink)
    }

    /// Create an engine with an explicit policy.
    pub fn with_policy(
        policy: DisputePolicy,
        gateway: Arc<dyn PayoutGateway>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            policy,
            store: DisputeStore::new(),
            reputation: Mutex::new(ReputationLedger::new()),
            payout_accounts: RwLock::new(HashMap::new()),
            gateway,
            sink,
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &DisputePolicy {
        &self.policy
    }

    /// A seller's current reputation score.
    pub fn reputation_score(&self, seller: &UserId) -> u8 {
        self.reputation.lock().score(seller)
    }

    /// Register (or replace) a user's mobile-money payout account.
    pub fn register_payout_account(&self, user: UserId, msisdn: Msisdn) {
        self.payout_accounts.write().insert(user, msisdn);
    }

    // ── Caller-facing operations ───────────────────────────────────

    /// Open a dispute against an order. Only the buyer themselves may
    /// open it.
    pub fn open_dispute(
        &self,
        caller: &Caller,
        request: OpenDisputeRequest,
        now: DateTime<Utc>,
    ) -> Result<DisputeId, EngineError> {
        if caller.user != request.buyer {
            return Err(self.deny(caller, "open_dispute", "only the buyer may open a dispute"));
        }

        let dispute = Dispute::open(request, &self.policy, now)?;
        let dispute_id = dispute.id;
        let seller = dispute.seller;

        let mut record = DisputeRecord::new(dispute);
        record.timeline.append(TimelineEntry::from_user(
            dispute_id,
            record.dispute.buyer,
            ParticipantRole::Buyer,
            record.dispute.description.clone(),
            None,
            Timestamp::from_datetime(now),
        )?);

        self.reputation.lock().apply_delta(
            &seller,
            self.policy.opening_delta,
            ReputationReason::DisputeOpened,
            dispute_id,
            now,
        );

        let event = DisputeEvent::DisputeOpened {
            dispute_id,
            order_id: record.dispute.order_id,
            buyer: record.dispute.buyer,
            seller,
        };
        self.store.insert(record);

        tracing::info!(dispute = %dispute_id, seller = %seller, "dispute opened");
        self.emit(event);
        Ok(dispute_id)
    }

    /// The seller's first response. Only the dispute's seller may call.
    pub fn seller_respond(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
        response: &str,
        evidence: Option<EvidenceRef>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.with_record(dispute_id, |record| {
            if caller.user != record.dispute.seller {
                return Err(self.deny(
                    caller,
                    "seller_respond",
                    "only the dispute's seller may respond",
                ));
            }

            record.dispute.seller_respond(response, &self.policy, now)?;
            if let Some(item) = &evidence {
                record.dispute.attach_evidence(item.clone(), now)?;
            }
            record.timeline.append(TimelineEntry::from_user(
                record.dispute.id,
                caller.user,
                ParticipantRole::Seller,
                response,
                evidence,
                Timestamp::from_datetime(now),
            )?);

            self.emit(DisputeEvent::SellerResponded {
                dispute_id: *dispute_id,
                seller: caller.user,
            });
            Ok(())
        })
    }

    /// Record one party's resolution proposal. When the parties converge
    /// on the same (kind, amount) pair, the dispute resolves.
    pub fn propose_agreement(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
        proposal: ResolutionProposal,
        now: DateTime<Utc>,
    ) -> Result<ProposalOutcome, EngineError> {
        self.with_record(dispute_id, |record| {
            let (party, role) = self.negotiating_party(caller, record, "propose_agreement")?;

            // A refund cannot settle into a wallet that does not exist;
            // refuse to record a refund proposal until the buyer has a
            // payout account.
            if proposal.kind.implies_refund() {
                self.payout_recipient(&record.dispute.buyer)?;
            }

            let outcome = record
                .dispute
                .propose_agreement(party, proposal.clone(), now)?;

            let body = match &proposal.amount {
                Some(amount) => format!("Proposed resolution: {} ({amount})", proposal.kind),
                None => format!("Proposed resolution: {}", proposal.kind),
            };
            record.timeline.append(TimelineEntry::from_user(
                record.dispute.id,
                caller.user,
                role,
                body,
                None,
                Timestamp::from_datetime(now),
            )?);

            if let ProposalOutcome::Converged { kind, amount } = &outcome {
                record.timeline.append(TimelineEntry::system(
                    record.dispute.id,
                    format!("Both parties agreed on {kind}; dispute resolved."),
                    Timestamp::from_datetime(now),
                ));
                if let (true, Some(due)) = (kind.implies_refund(), amount) {
                    let recipient = self.payout_recipient(&record.dispute.buyer)?;
                    record.disbursement = Some(DisbursementRequest::create(
                        record.dispute.id,
                        recipient,
                        due.clone(),
                        now,
                    ));
                    self.dispatch_disbursement(record, now);
                }
                self.emit(DisputeEvent::DisputeResolved {
                    dispute_id: *dispute_id,
                    kind: *kind,
                    amount: amount.clone(),
                });
            }
            Ok(outcome)
        })
    }

    /// Manually escalate a negotiation to admin review. Either party may
    /// call.
    pub fn escalate(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.with_record(dispute_id, |record| {
            let (_, role) = self.negotiating_party(caller, record, "escalate")?;

            record
                .dispute
                .escalate(EscalationTrigger::Manual, &self.policy, now)?;
            record.timeline.append(TimelineEntry::from_user(
                record.dispute.id,
                caller.user,
                role,
                "Requested escalation to admin review.",
                None,
                Timestamp::from_datetime(now),
            )?);

            self.emit(DisputeEvent::EscalatedToAdmin {
                dispute_id: *dispute_id,
                trigger: EscalationTrigger::Manual,
            });
            Ok(())
        })
    }

    /// An admin decision on an escalated dispute.
    pub fn admin_decide(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
        kind: ResolutionKind,
        amount: Option<Money>,
        reasoning: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !caller.is_admin() {
            return Err(self.deny(caller, "admin_decide", "admin capability required"));
        }

        self.with_record(dispute_id, |record| {
            let recipient = if kind.implies_refund() {
                Some(self.payout_recipient(&record.dispute.buyer)?)
            } else {
                None
            };

            record
                .dispute
                .admin_decide(kind, amount, reasoning, &self.policy, now)?;
            record.timeline.append(TimelineEntry::from_user(
                record.dispute.id,
                caller.user,
                ParticipantRole::Admin,
                reasoning,
                None,
                Timestamp::from_datetime(now),
            )?);

            let decided = record.dispute.resolution();
            if decided == ResolutionKind::Rejected {
                self.reputation.lock().apply_delta(
                    &record.dispute.seller,
                    self.policy.vindication_delta,
                    ReputationReason::SellerVindicated,
                    *dispute_id,
                    now,
                );
            } else if decided.favors_buyer() {
                self.reputation.lock().apply_delta(
                    &record.dispute.seller,
                    self.policy.fault_delta,
                    ReputationReason::SellerAtFault,
                    *dispute_id,
                    now,
                );
            }

            if let (Some(recipient), Some(due)) = (recipient, record.dispute.refund_due().cloned())
            {
                record.disbursement = Some(DisbursementRequest::create(
                    record.dispute.id,
                    recipient,
                    due,
                    now,
                ));
                self.dispatch_disbursement(record, now);
            }

            tracing::info!(dispute = %dispute_id, kind = %decided, "admin decision recorded");
            self.emit(DisputeEvent::DisputeResolved {
                dispute_id: *dispute_id,
                kind: decided,
                amount: record.dispute.resolution_amount().cloned(),
            });
            Ok(())
        })
    }

    /// Append a free-form message to a dispute's timeline. Parties may
    /// write to their own disputes, admins to any; nobody writes to a
    /// closed one.
    pub fn append_message(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
        body: &str,
        evidence: Option<EvidenceRef>,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.with_record(dispute_id, |record| {
            let role = self.message_role(caller, record, "append_message")?;

            if record.dispute.state.is_terminal() {
                return Err(soko_dispute::DisputeError::TerminalState {
                    dispute_id: record.dispute.id.to_string(),
                    state: record.dispute.state.as_str().to_string(),
                }
                .into());
            }
            if let Some(item) = &evidence {
                record.dispute.attach_evidence(item.clone(), now)?;
            }
            record.timeline.append(TimelineEntry::from_user(
                record.dispute.id,
                caller.user,
                role,
                body,
                evidence,
                Timestamp::from_datetime(now),
            )?);
            Ok(())
        })
    }

    /// Apply a settlement callback from the disbursement gateway.
    ///
    /// Idempotent under at-least-once delivery: a replayed callback for a
    /// settled key is answered with [`SettlementOutcome::Duplicate`] and
    /// causes no second reputation delta, timeline entry, or event.
    pub fn record_settlement(
        &self,
        key: IdempotencyKey,
        notice: SettlementNotice,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, EngineError> {
        self.with_record(&key.dispute_id, |record| {
            let request = record
                .disbursement
                .as_mut()
                .ok_or_else(|| EngineError::NoDisbursement(key.dispute_id.to_string()))?;

            if key.attempt < request.attempt {
                // Superseded attempt: its failure was already accounted
                // for when the retry began.
                return Ok(SettlementOutcome::Duplicate);
            }
            if key.attempt > request.attempt {
                return Err(PayoutError::UnknownKey(key.to_string()).into());
            }

            match notice {
                SettlementNotice::Settled { external_ref } => {
                    let outcome = request.record_settled(external_ref.clone(), now)?;
                    if outcome == SettlementOutcome::Applied {
                        record.dispute.close(now)?;
                        record.timeline.append(TimelineEntry::system(
                            key.dispute_id,
                            format!("Refund settled (reference {external_ref}); dispute closed."),
                            Timestamp::from_datetime(now),
                        ));
                        tracing::info!(dispute = %key.dispute_id, reference = %external_ref, "refund settled");
                        self.emit(DisputeEvent::RefundSettled {
                            dispute_id: key.dispute_id,
                            external_ref,
                        });
                    }
                    Ok(outcome)
                }
                SettlementNotice::Failed { reason } => {
                    let outcome = request.record_failed(reason.clone(), now)?;
                    if outcome == SettlementOutcome::Applied {
                        self.disbursement_failure_effects(record, &reason, now);
                    }
                    Ok(outcome)
                }
            }
        })
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Fetch one dispute with its timeline and disbursement record.
    /// Visible to its parties and to admins.
    pub fn get_dispute(
        &self,
        caller: &Caller,
        dispute_id: &DisputeId,
    ) -> Result<DisputeView, EngineError> {
        self.with_record(dispute_id, |record| {
            let is_party =
                caller.user == record.dispute.buyer || caller.user == record.dispute.seller;
            if !is_party && !caller.is_admin() {
                return Err(self.deny(caller, "get_dispute", "not a party to this dispute"));
            }
            Ok(DisputeView {
                dispute: record.dispute.clone(),
                timeline: record.timeline.entries().to_vec(),
                disbursement: record.disbursement.clone(),
            })
        })
    }

    /// List a buyer's disputes, newest first. Visible to that buyer and
    /// to admins.
    pub fn list_disputes_for_buyer(
        &self,
        caller: &Caller,
        buyer: &UserId,
        page: Page,
    ) -> Result<Vec<DisputeSummary>, EngineError> {
        if caller.user != *buyer && !caller.is_admin() {
            return Err(self.deny(
                caller,
                "list_disputes_for_buyer",
                "may only list own disputes",
            ));
        }
        Ok(self.list_where(page, true, |d| d.buyer == *buyer))
    }

    /// List a seller's disputes, newest first. Visible to that seller and
    /// to admins.
    pub fn list_disputes_for_seller(
        &self,
        caller: &Caller,
        seller: &UserId,
        page: Page,
    ) -> Result<Vec<DisputeSummary>, EngineError> {
        if caller.user != *seller && !caller.is_admin() {
            return Err(self.deny(
                caller,
                "list_disputes_for_seller",
                "may only list own disputes",
            ));
        }
        Ok(self.list_where(page, true, |d| d.seller == *seller))
    }

    /// The admin work queue: disputes awaiting arbitration, oldest first.
    pub fn list_pending_admin_review(
        &self,
        caller: &Caller,
        page: Page,
    ) -> Result<Vec<DisputeSummary>, EngineError> {
        if !caller.is_admin() {
            return Err(self.deny(
                caller,
                "list_pending_admin_review",
                "admin capability required",
            ));
        }
        Ok(self.list_where(page, false, |d| {
            d.state == soko_dispute::DisputeState::AdminReview
        }))
    }

    // ── Internal ───────────────────────────────────────────────────

    pub(crate) fn with_record<R>(
        &self,
        dispute_id: &DisputeId,
        f: impl FnOnce(&mut DisputeRecord) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let handle = self
            .store
            .get(dispute_id)
            .ok_or_else(|| EngineError::DisputeNotFound(dispute_id.to_string()))?;
        let mut record = handle.lock();
        f(&mut record)
    }

    pub(crate) fn store(&self) -> &DisputeStore {
        &self.store
    }

    pub(crate) fn emit(&self, event: DisputeEvent) {
        tracing::debug!(event = event.name(), dispute = %event.dispute_id(), "domain event");
        self.sink.publish(&event);
    }

    fn deny(&self, caller: &Caller, operation: &'static str, reason: &str) -> EngineError {
        tracing::warn!(
            caller = %caller.user,
            operation,
            reason,
            "authorization denied"
        );
        EngineError::Unauthorized {
            caller: caller.user.to_string(),
            operation,
            reason: reason.to_string(),
        }
    }

    fn negotiating_party(
        &self,
        caller: &Caller,
        record: &DisputeRecord,
        operation: &'static str,
    ) -> Result<(ProposingParty, ParticipantRole), EngineError> {
        if caller.user == record.dispute.buyer {
            Ok((ProposingParty::Buyer, ParticipantRole::Buyer))
        } else if caller.user == record.dispute.seller {
            Ok((ProposingParty::Seller, ParticipantRole::Seller))
        } else {
            Err(self.deny(caller, operation, "not a party to this dispute"))
        }
    }

    fn message_role(
        &self,
        caller: &Caller,
        record: &DisputeRecord,
        operation: &'static str,
    ) -> Result<ParticipantRole, EngineError> {
        if caller.user == record.dispute.buyer {
            Ok(ParticipantRole::Buyer)
        } else if caller.user == record.dispute.seller {
            Ok(ParticipantRole::Seller)
        } else if caller.is_admin() {
            Ok(ParticipantRole::Admin)
        } else {
            Err(self.deny(caller, operation, "not a party to this dispute"))
        }
    }

    fn payout_recipient(&self, buyer: &UserId) -> Result<Msisdn, EngineError> {
        self.payout_accounts
            .read()
            .get(buyer)
            .cloned()
            .ok_or_else(|| EngineError::MissingPayoutAccount(buyer.to_string()))
    }

    fn list_where(
        &self,
        page: Page,
        newest_first: bool,
        filter: impl Fn(&Dispute) -> bool,
    ) -> Vec<DisputeSummary> {
        let mut rows: Vec<DisputeSummary> = self
            .store
            .snapshot()
            .iter()
            .filter_map(|handle| {
                let record = handle.lock();
                filter(&record.dispute).then(|| DisputeSummary::from(&record.dispute))
            })
            .collect();
        rows.sort_by(|a, b| {
            let ordering = a.opened_at.cmp(&b.opened_at).then(a.id.as_uuid().cmp(b.id.as_uuid()));
            if newest_first {
                ordering.reverse()
            } else {
                ordering
            }
        });
        page.slice(rows)
    }

    /// Submit the pending disbursement to the gateway.
    ///
    /// The request record is already durable; a gateway error here is
    /// recorded as a failed attempt and retried by the sweep, never
    /// surfaced to the caller that triggered the resolution.
    pub(crate) fn dispatch_disbursement(&self, record: &mut DisputeRecord, now: DateTime<Utc>) {
        let instruction = match &record.disbursement {
            Some(request) if request.status == DisbursementStatus::Pending => {
                DisbursementInstruction {
                    dispute_id: request.dispute_id,
                    recipient: request.recipient.clone(),
                    amount: request.amount.clone(),
                    idempotency_key: request.idempotency_key(),
                }
            }
            _ => return,
        };

        match self.gateway.request_disbursement(&instruction) {
            Ok(ack) => {
                tracing::info!(
                    dispute = %instruction.dispute_id,
                    gateway = self.gateway.gateway_name(),
                    reference = %ack.external_ref,
                    "disbursement dispatched"
                );
                if let Some(request) = record.disbursement.as_mut() {
                    request.external_ref = Some(ack.external_ref);
                }
            }
            Err(err) => {
                tracing::warn!(
                    dispute = %instruction.dispute_id,
                    gateway = self.gateway.gateway_name(),
                    error = %err,
                    "disbursement dispatch failed"
                );
                let reason = err.to_string();
                let applied = record
                    .disbursement
                    .as_mut()
                    .is_some_and(|request| {
                        matches!(
                            request.record_failed(reason.clone(), now),
                            Ok(SettlementOutcome::Applied)
                        )
                    });
                if applied {
                    self.disbursement_failure_effects(record, &reason, now);
                }
            }
        }
    }

    /// Timeline, event, and operator-alert effects of one applied
    /// disbursement failure.
    pub(crate) fn disbursement_failure_effects(
        &self,
        record: &mut DisputeRecord,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        let Some(request) = record.disbursement.as_ref() else {
            return;
        };
        let attempts = request.attempt;
        let dispute_id = request.dispute_id;

        record.timeline.append(TimelineEntry::system(
            dispute_id,
            format!("Refund disbursement attempt {attempts} failed: {reason}"),
            Timestamp::from_datetime(now),
        ));

        if attempts >= self.policy.refund_retry_cap {
            // Not dropped silently: the exhausted refund is an operator
            // problem from here on.
            tracing::error!(
                dispute = %dispute_id,
                attempts,
                cap = self.policy.refund_retry_cap,
                "refund retry cap reached; operator intervention required"
            );
            record.timeline.append(TimelineEntry::system(
                dispute_id,
                format!(
                    "Refund retry cap of {} reached; operator intervention required.",
                    self.policy.refund_retry_cap
                ),
                Timestamp::from_datetime(now),
            ));
        }

        self.emit(DisputeEvent::RefundFailed {
            dispute_id,
            attempts,
        });
    }
}
