//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers used across the dispute
//! engine. Each identifier is a distinct type — you cannot pass a
//! [`UserId`] where an [`OrderId`] is expected.
//!
//! ## Validation
//!
//! UUID-based identifiers ([`DisputeId`], [`OrderId`], [`UserId`],
//! [`PayoutId`]) are always valid by construction. The string-based
//! [`Msisdn`] payout identifier validates format at construction time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a dispute aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisputeId(Uuid);

impl DisputeId {
    /// Create a new random dispute identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a dispute identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DisputeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispute:{}", self.0)
    }
}

/// A unique identifier for the marketplace order a dispute concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new random order identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an order identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

/// A unique identifier for a marketplace user (buyer, seller, or admin).
///
/// The engine does not distinguish user kinds at the type level — the same
/// account may buy in one transaction and sell in another. Role is a
/// per-dispute fact, established by the dispute's buyer and seller fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a new random user identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a user identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// A unique identifier for a disbursement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutId(Uuid);

impl PayoutId {
    /// Create a new random payout identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a payout identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payout:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Msisdn (validated at construction)
// ---------------------------------------------------------------------------

/// A mobile-money payout identifier in MSISDN form.
///
/// Disbursements are settled to the buyer's registered mobile-money wallet,
/// addressed by phone number. The canonical storage format is `+` followed
/// by 10-15 digits. The constructor accepts both:
///
/// - `"+254712345678"` (international format)
/// - `"254712345678"` (digits only; a `+` is prepended)
///
/// # Validation
///
/// - 10-15 digits after stripping the optional leading `+`
/// - Digits only, no separators
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Msisdn(String);

impl Msisdn {
    /// Create an MSISDN from a string value, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidMsisdn`] if the value is not
    /// 10-15 digits with at most one leading `+`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let digits = raw.strip_prefix('+').unwrap_or(&raw);

        if digits.len() < 10 || digits.len() > 15 {
            return Err(ValidationError::InvalidMsisdn(raw));
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidMsisdn(raw));
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Access the canonical `+`-prefixed form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Msisdn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
