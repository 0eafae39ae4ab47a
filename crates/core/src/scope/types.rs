//! Actor and scope types.

use defter_shared::types::{FirmId, UserId};
use serde::{Deserialize, Serialize};

/// Role of an acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single super-tenant operator; sees every firm.
    SuperOperator,
    /// Administrator within one firm.
    FirmAdmin,
    /// Staff member within one firm.
    Employee,
}

impl Role {
    /// Returns true if this role is bound to a single firm.
    #[must_use]
    pub fn is_firm_bound(self) -> bool {
        !matches!(self, Self::SuperOperator)
    }
}

/// The authenticated actor a command executes as.
///
/// Supplied by the external auth layer; the core trusts it as already
/// authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// The acting user.
    pub user_id: UserId,
    /// The actor's role.
    pub role: Role,
    /// The actor's firm; `None` only for the super-tenant operator.
    pub firm_id: Option<FirmId>,
}

impl Actor {
    /// Creates an actor bound to a firm.
    #[must_use]
    pub const fn firm_member(user_id: UserId, role: Role, firm_id: FirmId) -> Self {
        Self {
            user_id,
            role,
            firm_id: Some(firm_id),
        }
    }

    /// Creates the super-tenant operator actor.
    #[must_use]
    pub const fn super_operator(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::SuperOperator,
            firm_id: None,
        }
    }
}

/// The row filter an actor's commands must be restricted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// No firm restriction (super operator without an explicit filter).
    Unrestricted,
    /// Restricted to rows owned by one firm.
    Firm(FirmId),
}

impl TenantScope {
    /// Returns true if rows owned by `firm` are visible in this scope.
    #[must_use]
    pub fn permits(&self, firm: FirmId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Firm(own) => *own == firm,
        }
    }

    /// Returns the firm restriction, if any.
    #[must_use]
    pub const fn firm(&self) -> Option<FirmId> {
        match self {
            Self::Unrestricted => None,
            Self::Firm(firm) => Some(*firm),
        }
    }
}
