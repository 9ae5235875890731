//! # Resolution Kinds and Proposals
//!
//! The outcome vocabulary of a dispute. While a dispute is open its
//! resolution kind is [`Undecided`](ResolutionKind::Undecided); a
//! resolution is fixed exactly once, by party convergence in negotiation
//! or by an admin decision, and is immutable afterwards.

use serde::{Deserialize, Serialize};

use soko_core::{Money, ValidationError};

// ── Resolution Kind ────────────────────────────────────────────────────

/// The decided (or not yet decided) outcome of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// No resolution yet. The only legal kind while the dispute is open.
    Undecided,
    /// The full disputed amount is returned to the buyer.
    FullRefund,
    /// Part of the disputed amount is returned to the buyer.
    PartialRefund,
    /// The seller ships a replacement; no money moves.
    Replacement,
    /// The buyer's claim is rejected; the seller is vindicated.
    Rejected,
    /// The parties settled on terms outside the refund vocabulary.
    MutualAgreement,
}

impl ResolutionKind {
    /// Whether this kind entails a disbursement back to the buyer.
    pub fn implies_refund(&self) -> bool {
        matches!(self, Self::FullRefund | Self::PartialRefund)
    }

    /// Whether an admin decision of this kind finds against the seller.
    ///
    /// Drives the reputation adjustment: a decision in the buyer's favor
    /// applies the fault penalty, `Rejected` applies the vindication
    /// reward, and `MutualAgreement` moves no reputation.
    pub fn favors_buyer(&self) -> bool {
        matches!(self, Self::FullRefund | Self::PartialRefund | Self::Replacement)
    }

    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undecided => "undecided",
            Self::FullRefund => "full_refund",
            Self::PartialRefund => "partial_refund",
            Self::Replacement => "replacement",
            Self::Rejected => "rejected",
            Self::MutualAgreement => "mutual_agreement",
        }
    }
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Resolution Proposal ────────────────────────────────────────────────

/// A resolution one party puts forward during negotiation.
///
/// A dispute resolves by convergence: when the buyer's and the seller's
/// recorded proposals are equal on both kind and amount, the state machine
/// moves to `Resolved`. Conflicting proposals cause no transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionProposal {
    /// The proposed outcome kind. Never `Undecided`.
    pub kind: ResolutionKind,
    /// The proposed amount, for kinds that carry one.
    pub amount: Option<Money>,
}

impl ResolutionProposal {
    /// Validate the proposal against the amount in dispute and return the
    /// normalized `(kind, amount)` pair that would be recorded.
    ///
    /// Normalization fixes `FullRefund` to the full disputed amount so
    /// that `FullRefund` proposed with and without an explicit amount
    /// compare equal.
    ///
    /// # Errors
    ///
    /// - `Undecided` is not proposable.
    /// - `PartialRefund` requires a positive amount not exceeding the
    ///   disputed amount, in the same currency.
    /// - `FullRefund` with an explicit amount must match the disputed
    ///   amount exactly.
    /// - Non-refund kinds must not carry an amount.
    pub fn normalize(&self, disputed: &Money) -> Result<(ResolutionKind, Option<Money>), ValidationError> {
        match self.kind {
            ResolutionKind::Undecided => Err(ValidationError::EmptyField { field: "kind" }),
            ResolutionKind::FullRefund => {
                if let Some(amount) = &self.amount {
                    if amount != disputed {
                        return Err(ValidationError::AmountExceedsCap {
                            requested: amount.amount_minor(),
                            cap: disputed.amount_minor(),
                            currency: disputed.currency().to_string(),
                        });
                    }
                }
                Ok((ResolutionKind::FullRefund, Some(disputed.clone())))
            }
            ResolutionKind::PartialRefund => {
                let amount = self
                    .amount
                    .clone()
                    .ok_or(ValidationError::EmptyField { field: "amount" })?;
                if amount.is_zero() {
                    return Err(ValidationError::NonPositiveAmount(0));
                }
                amount.ensure_within(disputed)?;
                Ok((ResolutionKind::PartialRefund, Some(amount)))
            }
            kind => {
                if self.amount.is_some() {
                    return Err(ValidationError::UnexpectedAmount {
                        kind: kind.as_str().to_string(),
                    });
                }
                Ok((kind, None))
            }
        }
    }
}

// ── Proposal Outcome ───────────────────────────────────────────────────

/// What recording a proposal achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// The proposal was recorded; the counterpart has not (yet) agreed.
    Recorded,
    /// Both parties now hold the same proposal; the dispute resolved.
    Converged {
        /// The agreed resolution kind.
        kind: ResolutionKind,
        /// The agreed amount, when the kind carries one.
        amount: Option<Money>,
    },
}
