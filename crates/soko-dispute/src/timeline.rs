//! # Dispute Timeline
//!
//! The append-only, per-dispute sequence of communications. Entries serve
//! both as the negotiation channel between the parties and as the audit
//! trail an admin reads before deciding a case.
//!
//! Entries are never edited or deleted once written; the [`Timeline`] type
//! exposes only append and in-creation-order reads.

use serde::{Deserialize, Serialize};

use soko_core::{DisputeId, Timestamp, UserId, ValidationError};

use crate::evidence::EvidenceRef;

// ── Participant Role ───────────────────────────────────────────────────

/// Who authored a timeline entry.
///
/// `System` covers entries the engine writes itself: auto-escalation
/// notices from the deadline sweeper and disbursement outcome records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// The buyer who opened the dispute.
    Buyer,
    /// The seller the dispute is against.
    Seller,
    /// A platform administrator.
    Admin,
    /// The engine itself (sweeper, settlement callbacks).
    System,
}

impl ParticipantRole {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Timeline Entry ─────────────────────────────────────────────────────

/// One message in a dispute's audit/negotiation log.
///
/// Immutable once appended. An entry may carry at most one evidence
/// reference; bulk evidence travels on the dispute aggregate itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// The dispute this entry belongs to.
    pub dispute_id: DisputeId,
    /// The authoring user. `None` for system-authored entries.
    pub author: Option<UserId>,
    /// The author's role in the dispute.
    pub role: ParticipantRole,
    /// Message text.
    pub body: String,
    /// Optional attached evidence reference.
    pub evidence: Option<EvidenceRef>,
    /// When the entry was appended.
    pub posted_at: Timestamp,
}

impl TimelineEntry {
    /// Create a human-authored entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when the body is blank.
    pub fn from_user(
        dispute_id: DisputeId,
        author: UserId,
        role: ParticipantRole,
        body: impl Into<String>,
        evidence: Option<EvidenceRef>,
        posted_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "body" });
        }
        Ok(Self {
            dispute_id,
            author: Some(author),
            role,
            body,
            evidence,
            posted_at,
        })
    }

    /// Create a system-authored entry (no user attribution).
    pub fn system(dispute_id: DisputeId, body: impl Into<String>, posted_at: Timestamp) -> Self {
        Self {
            dispute_id,
            author: None,
            role: ParticipantRole::System,
            body: body.into(),
            evidence: None,
            posted_at,
        }
    }
}

// ── Timeline ───────────────────────────────────────────────────────────

/// The append-only message log of one dispute.
///
/// Owned by the dispute record; entries cannot outlive it. There is no
/// remove, edit, or truncate operation — the history an admin reviews is
/// exactly the history that was written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn append(&mut self, entry: TimelineEntry) {
        self.entries.push(entry);
    }

    /// All entries in creation order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&TimelineEntry> {
        self.entries.last()
    }

    /// Entries authored under the given role.
    pub fn entries_by_role(&self, role: ParticipantRole) -> Vec<&TimelineEntry> {
        self.entries.iter().filter(|e| e.role == role).collect()
    }
}
