//! # Domain Events
//!
//! Every successful transition emits exactly one domain event. An external
//! notifier subscribes through [`EventSink`] and decides how to deliver
//! (email, SMS, push); the engine neither knows nor cares.
//!
//! Events are emitted after the transition has committed — a consumer
//! never observes an event for state that did not stick.

use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Money, OrderId, UserId};

use crate::dispute::EscalationTrigger;
use crate::resolution::ResolutionKind;

// ── Event ──────────────────────────────────────────────────────────────

/// A domain event describing a committed dispute transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisputeEvent {
    /// A buyer opened a dispute.
    DisputeOpened {
        /// The new dispute.
        dispute_id: DisputeId,
        /// The order under dispute.
        order_id: OrderId,
        /// The opening buyer.
        buyer: UserId,
        /// The seller the dispute is against.
        seller: UserId,
    },
    /// The seller responded within the response window.
    SellerResponded {
        /// The dispute.
        dispute_id: DisputeId,
        /// The responding seller.
        seller: UserId,
    },
    /// The dispute moved to admin arbitration.
    EscalatedToAdmin {
        /// The dispute.
        dispute_id: DisputeId,
        /// What drove the escalation.
        trigger: EscalationTrigger,
    },
    /// A resolution was fixed, by convergence or admin decision.
    DisputeResolved {
        /// The dispute.
        dispute_id: DisputeId,
        /// The decided outcome.
        kind: ResolutionKind,
        /// The decided amount, when the kind carries one.
        amount: Option<Money>,
    },
    /// The refund disbursement settled at the gateway.
    RefundSettled {
        /// The dispute.
        dispute_id: DisputeId,
        /// The gateway's settlement reference.
        external_ref: String,
    },
    /// A refund disbursement attempt failed at the gateway.
    RefundFailed {
        /// The dispute.
        dispute_id: DisputeId,
        /// How many attempts have now failed.
        attempts: u32,
    },
}

impl DisputeEvent {
    /// The dispute this event concerns.
    pub fn dispute_id(&self) -> DisputeId {
        match self {
            Self::DisputeOpened { dispute_id, .. }
            | Self::SellerResponded { dispute_id, .. }
            | Self::EscalatedToAdmin { dispute_id, .. }
            | Self::DisputeResolved { dispute_id, .. }
            | Self::RefundSettled { dispute_id, .. }
            | Self::RefundFailed { dispute_id, .. } => *dispute_id,
        }
    }

    /// The canonical event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DisputeOpened { .. } => "dispute_opened",
            Self::SellerResponded { .. } => "seller_responded",
            Self::EscalatedToAdmin { .. } => "escalated_to_admin",
            Self::DisputeResolved { .. } => "dispute_resolved",
            Self::RefundSettled { .. } => "refund_settled",
            Self::RefundFailed { .. } => "refund_failed",
        }
    }
}

// ── Sink ───────────────────────────────────────────────────────────────

/// Consumer seam for domain events.
///
/// Object-safe (`Send + Sync`) so the engine can hold the notifier as
/// `Arc<dyn EventSink>`. Implementations must not block: delivery work
/// belongs on the notifier's side of the seam.
pub trait EventSink: Send + Sync {
    /// Receive one committed event.
    fn publish(&self, event: &DisputeEvent);
}

/// A sink that drops every event. Useful when no notifier is wired up.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: &DisputeEvent) {}
}

/// A sink that buffers events in memory, for tests and batch forwarding.
#[derive(Debug, Default)]
pub struct BufferEventSink {
    events: parking_lot::Mutex<Vec<DisputeEvent>>,
}

impl BufferEventSink {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all buffered events in emission order.
    pub fn take(&self) -> Vec<DisputeEvent> {
        std::mem::take(&mut self.events.lock())
    }

    /// Snapshot of buffered events without draining.
    pub fn events(&self) -> Vec<DisputeEvent> {
        self.events.lock().clone()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for BufferEventSink {
    fn publish(&self, event: &DisputeEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> DisputeEvent {
        DisputeEvent::DisputeOpened {
            dispute_id: DisputeId::new(),
            order_id: OrderId::new(),
            buyer: UserId::new(),
            seller: UserId::new(),
        }
    }

    #[test]
    fn event_names() {
        assert_eq!(opened().name(), "dispute_opened");
        let resolved = DisputeEvent::DisputeResolved {
            dispute_id: DisputeId::new(),
            kind: ResolutionKind::FullRefund,
            amount: Some(Money::new(2000, "KES").unwrap()),
        };
        assert_eq!(resolved.name(), "dispute_resolved");
    }

    #[test]
    fn dispute_id_accessor() {
        let event = opened();
        if let DisputeEvent::DisputeOpened { dispute_id, .. } = &event {
            assert_eq!(event.dispute_id(), *dispute_id);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn serde_tags_event_type() {
        let json = serde_json::to_string(&opened()).unwrap();
        assert!(json.contains("\"type\":\"dispute_opened\""));
    }

    #[test]
    fn buffer_sink_records_in_order() {
        let sink = BufferEventSink::new();
        let a = opened();
        let b = DisputeEvent::RefundFailed {
            dispute_id: DisputeId::new(),
            attempts: 2,
        };
        sink.publish(&a);
        sink.publish(&b);

        assert_eq!(sink.len(), 2);
        let drained = sink.take();
        assert_eq!(drained[0], a);
        assert_eq!(drained[1], b);
        assert!(sink.is_empty());
    }

    #[test]
    fn null_sink_discards() {
        let sink = NullEventSink;
        sink.publish(&opened()); // no panic, nothing to observe
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = DisputeEvent::EscalatedToAdmin {
            dispute_id: DisputeId::new(),
            trigger: EscalationTrigger::ResponseDeadline,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: DisputeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
