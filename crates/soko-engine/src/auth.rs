//! # Caller Identity
//!
//! The engine trusts a caller identity and capability claim handed to it
//! by the surrounding application — authentication happens elsewhere.
//! What the engine enforces, centrally and per operation, is that the
//! identity matches the role the operation implies: only the dispute's
//! seller may respond, only a caller with the admin capability may
//! decide.
//!
//! Identity is always an explicit parameter. There is no ambient
//! "current user" anywhere in the engine.

use serde::{Deserialize, Serialize};

use soko_core::UserId;

/// The capability a caller presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// An ordinary marketplace user; may act on disputes they are a
    /// party to.
    Customer,
    /// A platform administrator; may arbitrate any dispute and read any
    /// record.
    Admin,
}

/// An authenticated caller, as asserted by the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// The caller's user identity.
    pub user: UserId,
    /// The capability claim attached to the session.
    pub capability: Capability,
}

impl Caller {
    /// A caller with the customer capability.
    pub fn customer(user: UserId) -> Self {
        Self {
            user,
            capability: Capability::Customer,
        }
    }

    /// A caller with the admin capability.
    pub fn admin(user: UserId) -> Self {
        Self {
            user,
            capability: Capability::Admin,
        }
    }

    /// Whether this caller holds the admin capability.
    pub fn is_admin(&self) -> bool {
        self.capability == Capability::Admin
    }
}
