//! # Read Models
//!
//! Snapshots the engine hands to callers. Views are clones taken under
//! the dispute's lock — a caller can never observe a half-applied
//! transition, and holding a view never blocks writers.

use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Money, OrderId, Timestamp, UserId};
use soko_dispute::{Dispute, DisputeState, IssueCategory, ResolutionKind, TimelineEntry};
use soko_payout::DisbursementRequest;

/// A full snapshot of one dispute: aggregate, timeline, and any
/// disbursement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeView {
    /// The dispute aggregate.
    pub dispute: Dispute,
    /// The timeline in creation order.
    pub timeline: Vec<TimelineEntry>,
    /// The disbursement request, when a refund is in flight or settled.
    pub disbursement: Option<DisbursementRequest>,
}

/// A list-row summary of one dispute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeSummary {
    /// The dispute identifier.
    pub id: DisputeId,
    /// The order under dispute.
    pub order_id: OrderId,
    /// The buyer.
    pub buyer: UserId,
    /// The seller.
    pub seller: UserId,
    /// The issue category.
    pub category: IssueCategory,
    /// Short title.
    pub title: String,
    /// The disputed amount.
    pub amount: Money,
    /// Current state.
    pub state: DisputeState,
    /// Current resolution kind.
    pub resolution: ResolutionKind,
    /// When the dispute was opened.
    pub opened_at: Timestamp,
    /// When the dispute last changed.
    pub updated_at: Timestamp,
}

impl From<&Dispute> for DisputeSummary {
    fn from(dispute: &Dispute) -> Self {
        Self {
            id: dispute.id,
            order_id: dispute.order_id,
            buyer: dispute.buyer,
            seller: dispute.seller,
            category: dispute.category,
            title: dispute.title.clone(),
            amount: dispute.amount.clone(),
            state: dispute.state,
            resolution: dispute.resolution(),
            opened_at: dispute.opened_at.clone(),
            updated_at: dispute.updated_at.clone(),
        }
    }
}

/// Pagination window for list reads.
///
/// List responses are bounded only by pagination — the engine never
/// blocks a read for consistency beyond the instant a row is copied out
/// under its dispute's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

impl Page {
    /// The first page at the given size.
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// Apply the window to a sorted vector.
    pub(crate) fn slice<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page() {
        let page = Page::default();
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 50);
    }

    #[test]
    fn slice_applies_offset_and_limit() {
        let rows: Vec<i32> = (0..10).collect();
        let page = Page {
            offset: 3,
            limit: 4,
        };
        assert_eq!(page.slice(rows), vec![3, 4, 5, 6]);
    }

    #[test]
    fn slice_past_end_is_empty() {
        let rows: Vec<i32> = (0..3).collect();
        let page = Page {
            offset: 5,
            limit: 10,
        };
        assert!(page.slice(rows).is_empty());
    }

    #[test]
    fn first_page() {
        assert_eq!(Page::first(10), Page { offset: 0, limit: 10 });
    }
}
