//! # Deadline Sweeper
//!
//! The only place time-based transitions happen. A periodic sweep — the
//! interval is the embedding application's choice — walks all disputes
//! and:
//!
//! - escalates disputes whose seller-response window elapsed,
//! - escalates negotiations that ran past their window,
//! - retries failed refund disbursements below the retry cap,
//! - archives resolved, non-refund disputes past the closure grace.
//!
//! The sweep holds one dispute's lock at a time, never a lock across
//! disputes, so a slow dispute cannot stall the rest. Re-running a sweep
//! over the same data is harmless: every transition guard re-checks the
//! current state, so the second pass finds nothing to do.

use chrono::{DateTime, Utc};

use soko_core::{DisputeId, Timestamp};
use soko_dispute::{DisputeEvent, DisputeState, EscalationTrigger, TimelineEntry};
use soko_payout::DisbursementStatus;

use crate::engine::DisputeEngine;

/// What one sweep pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Disputes escalated to admin review on a lapsed deadline.
    pub escalated: Vec<DisputeId>,
    /// Disputes whose failed disbursement was retried.
    pub retried: Vec<DisputeId>,
    /// Disputes archived after the closure grace period.
    pub closed: Vec<DisputeId>,
}

impl SweepReport {
    /// Whether the sweep changed nothing.
    pub fn is_empty(&self) -> bool {
        self.escalated.is_empty() && self.retried.is_empty() && self.closed.is_empty()
    }

    /// Total number of actions taken.
    pub fn actions(&self) -> usize {
        self.escalated.len() + self.retried.len() + self.closed.len()
    }
}

impl DisputeEngine {
    /// Run one sweep pass at the given instant.
    ///
    /// Safe to run concurrently with user-triggered transitions: a user
    /// operation that wins the race simply changes the state, and the
    /// sweep's guards then skip that dispute.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for handle in self.store().snapshot() {
            let mut record = handle.lock();
            let dispute_id = record.dispute.id;
            let policy = self.policy().clone();

            if record.dispute.is_response_overdue(&policy, now) {
                if record
                    .dispute
                    .escalate(EscalationTrigger::ResponseDeadline, &policy, now)
                    .is_ok()
                {
                    record.timeline.append(TimelineEntry::system(
                        dispute_id,
                        "Seller did not respond within the response window; escalated to admin review.",
                        Timestamp::from_datetime(now),
                    ));
                    tracing::info!(dispute = %dispute_id, "auto-escalated: response window elapsed");
                    self.emit(DisputeEvent::EscalatedToAdmin {
                        dispute_id,
                        trigger: EscalationTrigger::ResponseDeadline,
                    });
                    report.escalated.push(dispute_id);
                }
            } else if record.dispute.is_negotiation_overdue(&policy, now) {
                if record
                    .dispute
                    .escalate(EscalationTrigger::NegotiationDeadline, &policy, now)
                    .is_ok()
                {
                    record.timeline.append(TimelineEntry::system(
                        dispute_id,
                        "Negotiation window elapsed without agreement; escalated to admin review.",
                        Timestamp::from_datetime(now),
                    ));
                    tracing::info!(dispute = %dispute_id, "auto-escalated: negotiation window elapsed");
                    self.emit(DisputeEvent::EscalatedToAdmin {
                        dispute_id,
                        trigger: EscalationTrigger::NegotiationDeadline,
                    });
                    report.escalated.push(dispute_id);
                }
            }

            if record.dispute.state == DisputeState::Resolved {
                let retriable = record.disbursement.as_ref().is_some_and(|request| {
                    request.status == DisbursementStatus::Failed
                        && request.attempt < policy.refund_retry_cap
                });

                if retriable {
                    let retried = record
                        .disbursement
                        .as_mut()
                        .is_some_and(|request| request.begin_retry(now).is_ok());
                    if retried {
                        let attempt = record
                            .disbursement
                            .as_ref()
                            .map(|request| request.attempt)
                            .unwrap_or_default();
                        record.timeline.append(TimelineEntry::system(
                            dispute_id,
                            format!("Retrying refund disbursement (attempt {attempt})."),
                            Timestamp::from_datetime(now),
                        ));
                        self.dispatch_disbursement(&mut record, now);
                        report.retried.push(dispute_id);
                    }
                } else if record.disbursement.is_none() {
                    let grace_over = record.dispute.resolved_at.as_ref().is_some_and(
                        |resolved_at| now >= *resolved_at.as_datetime() + policy.close_grace(),
                    );
                    if grace_over && record.dispute.close(now).is_ok() {
                        record.timeline.append(TimelineEntry::system(
                            dispute_id,
                            "Closure grace period elapsed; dispute archived.",
                            Timestamp::from_datetime(now),
                        ));
                        report.closed.push(dispute_id);
                    }
                }
            }
        }

        if !report.is_empty() {
            tracing::info!(
                escalated = report.escalated.len(),
                retried = report.retried.len(),
                closed = report.closed.len(),
                "deadline sweep complete"
            );
        }
        report
    }
}
