//! # Minor-Unit Money
//!
//! Monetary amounts as integer counts of the smallest currency unit
//! (cents for USD, no subdivision for KES in practice but minor units are
//! carried uniformly). Floats never appear in financial values.
//!
//! The currency code is validated at construction (three uppercase ASCII
//! letters, ISO 4217 shape). Arithmetic never crosses currencies: the
//! comparison helpers return a [`ValidationError::CurrencyMismatch`] rather
//! than silently comparing raw integers.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A monetary amount in minor units of a single currency.
///
/// Amounts are non-negative by construction. Operations that require a
/// strictly positive amount check at the call site via [`Money::is_zero`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount_minor: i64,
    currency: String,
}

impl Money {
    /// Create an amount, validating the currency code and sign.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeAmount`] for negative amounts and
    /// [`ValidationError::InvalidCurrency`] when the currency code is not
    /// three uppercase ASCII letters.
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Result<Self, ValidationError> {
        let currency = currency.into();
        if amount_minor < 0 {
            return Err(ValidationError::NegativeAmount(amount_minor));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency(currency));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// The amount in minor units.
    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    /// The ISO 4217 currency code.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_minor == 0
    }

    /// Check that `self` does not exceed `cap`.
    ///
    /// Used to enforce the refund-amount bound: a resolution amount must
    /// never exceed the amount in dispute.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CurrencyMismatch`] when the currencies
    /// differ and [`ValidationError::AmountExceedsCap`] when the bound is
    /// violated.
    pub fn ensure_within(&self, cap: &Money) -> Result<(), ValidationError> {
        if self.currency != cap.currency {
            return Err(ValidationError::CurrencyMismatch {
                expected: cap.currency.clone(),
                actual: self.currency.clone(),
            });
        }
        if self.amount_minor > cap.amount_minor {
            return Err(ValidationError::AmountExceedsCap {
                requested: self.amount_minor,
                cap: cap.amount_minor,
                currency: self.currency.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount_minor, self.currency)
    }
}
