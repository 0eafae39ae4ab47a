//! Scope resolution from an actor context.

use defter_shared::types::FirmId;

use super::error::ScopeError;
use super::types::{Actor, Role, TenantScope};

/// Resolves the row filter for an actor, optionally narrowed to one firm.
///
/// - The super operator is unrestricted; an explicit firm filter narrows
///   the scope to that firm.
/// - Firm admins and employees are restricted to their own firm. An
///   explicit filter naming a different firm is denied, not silently
///   ignored; a firm-bound actor without a firm on record is denied
///   outright.
///
/// # Errors
///
/// Returns [`ScopeError`] when the actor cannot act under the requested
/// filter.
pub fn resolve(actor: &Actor, explicit_firm: Option<FirmId>) -> Result<TenantScope, ScopeError> {
    match actor.role {
        Role::SuperOperator => Ok(explicit_firm.map_or(TenantScope::Unrestricted, TenantScope::Firm)),
        Role::FirmAdmin | Role::Employee => {
            let own = actor.firm_id.ok_or(ScopeError::NoFirmAffiliation)?;
            match explicit_firm {
                Some(requested) if requested != own => Err(ScopeError::FirmMismatch { requested }),
                _ => Ok(TenantScope::Firm(own)),
            }
        }
    }
}

/// Verifies that a row owned by `owner` is visible in `scope`.
///
/// Applied after loading a row addressed by ID, so cross-tenant probes get
/// the same answer whether the row exists or not is decided by the caller
/// (most map this to `NotFound` to avoid leaking existence).
///
/// # Errors
///
/// Returns [`ScopeError::OutOfScope`] when the row is outside the scope.
pub fn ensure_in_scope(scope: &TenantScope, owner: FirmId) -> Result<(), ScopeError> {
    if scope.permits(owner) {
        Ok(())
    } else {
        Err(ScopeError::OutOfScope { owner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defter_shared::types::UserId;

    fn admin(firm: FirmId) -> Actor {
        Actor::firm_member(UserId::new(), Role::FirmAdmin, firm)
    }

    #[test]
    fn test_super_operator_unrestricted() {
        let actor = Actor::super_operator(UserId::new());
        assert_eq!(resolve(&actor, None).unwrap(), TenantScope::Unrestricted);
    }

    #[test]
    fn test_super_operator_narrows_to_explicit_firm() {
        let actor = Actor::super_operator(UserId::new());
        let firm = FirmId::new();
        assert_eq!(
            resolve(&actor, Some(firm)).unwrap(),
            TenantScope::Firm(firm)
        );
    }

    #[test]
    fn test_firm_admin_restricted_to_own_firm() {
        let firm = FirmId::new();
        assert_eq!(
            resolve(&admin(firm), None).unwrap(),
            TenantScope::Firm(firm)
        );
    }

    #[test]
    fn test_firm_admin_explicit_own_firm_is_fine() {
        let firm = FirmId::new();
        assert_eq!(
            resolve(&admin(firm), Some(firm)).unwrap(),
            TenantScope::Firm(firm)
        );
    }

    #[test]
    fn test_firm_admin_explicit_other_firm_denied() {
        let firm = FirmId::new();
        let other = FirmId::new();
        assert_eq!(
            resolve(&admin(firm), Some(other)),
            Err(ScopeError::FirmMismatch { requested: other })
        );
    }

    #[test]
    fn test_employee_without_firm_denied() {
        let actor = Actor {
            user_id: UserId::new(),
            role: Role::Employee,
            firm_id: None,
        };
        assert_eq!(resolve(&actor, None), Err(ScopeError::NoFirmAffiliation));
    }

    #[test]
    fn test_ensure_in_scope() {
        let firm = FirmId::new();
        let other = FirmId::new();
        let scope = TenantScope::Firm(firm);

        assert!(ensure_in_scope(&scope, firm).is_ok());
        assert_eq!(
            ensure_in_scope(&scope, other),
            Err(ScopeError::OutOfScope { owner: other })
        );
        assert!(ensure_in_scope(&TenantScope::Unrestricted, other).is_ok());
    }
}
