//! Tenant scope applied to queries.
//!
//! The core resolves *who may see what* as a pure [`TenantScope`]; this
//! module is the single place that scope becomes a query predicate. Every
//! repository filters through these helpers so a missing scope is a
//! grep-able defect, not a scattered one.

use defter_core::scope::TenantScope;
use sea_orm::{ColumnTrait, Condition};

use crate::entities::customers;

/// Restricts a query to rows owned by the scope's firm.
///
/// `firm_col` is the entity's tenant column. An unrestricted scope adds
/// no predicate.
pub fn firm_condition<C: ColumnTrait>(scope: &TenantScope, firm_col: C) -> Condition {
    match scope.firm() {
        None => Condition::all(),
        Some(firm) => Condition::all().add(firm_col.eq(firm.into_inner())),
    }
}

/// The customer read predicate: tenant scope plus the centralized
/// soft-delete filter. Tombstoned customers are invisible everywhere.
pub fn customer_visibility(scope: &TenantScope) -> Condition {
    firm_condition(scope, customers::Column::FirmId).add(customers::Column::IsDeleted.eq(false))
}
