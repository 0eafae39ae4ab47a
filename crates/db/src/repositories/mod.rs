//! Repository abstractions for data access.
//!
//! Repositories execute the core's posting plans and state transitions.
//! Every multi-row operation runs inside one database transaction; every
//! read and every existence check before a write is scoped through
//! [`crate::scope`].

pub mod cheque;
pub mod customer;
pub mod delivery_note;
pub mod invoice;
pub mod order;
pub mod payment;
pub mod stock;

pub use cheque::ChequeRepository;
pub use customer::CustomerRepository;
pub use delivery_note::DeliveryNoteRepository;
pub use invoice::InvoiceRepository;
pub use order::OrderRepository;
pub use payment::PaymentRepository;
pub use stock::StockRepository;

use defter_core::calc::{self, DocumentTotals, LineInput, LineTotals};
use defter_core::scope::TenantScope;
use defter_shared::{AppError, AppResult};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr};
use uuid::Uuid;

use crate::entities::customers;
use crate::scope::customer_visibility;

/// Current timestamp in the form the entities store.
pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

/// True when a statement failed on a unique index - the loud-failure
/// signal the number allocator and idempotency guards retry or report on.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// One caller-supplied line of an invoice or order.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    /// Optional catalog product the line refers to.
    pub product_id: Option<Uuid>,
    /// Line description.
    pub description: String,
    /// Quantity (non-negative).
    pub quantity: Decimal,
    /// Price per unit, excluding VAT.
    pub unit_price: Decimal,
    /// VAT rate in percent.
    pub vat_rate: Decimal,
    /// Discount in percent, 0..=100.
    pub discount_percent: Decimal,
}

impl NewLineItem {
    fn as_line_input(&self) -> LineInput {
        LineInput {
            quantity: self.quantity,
            unit_price: self.unit_price,
            vat_rate: self.vat_rate,
            discount_percent: self.discount_percent,
        }
    }
}

/// Runs the calculation engine over a full item set.
///
/// Returns per-line totals (aligned with the input order) and the
/// document totals.
pub(crate) fn compute_lines(
    items: &[NewLineItem],
) -> AppResult<(Vec<LineTotals>, DocumentTotals)> {
    let lines = items
        .iter()
        .map(|item| calc::calculate_line(&item.as_line_input()).map_err(AppError::from))
        .collect::<AppResult<Vec<_>>>()?;
    let totals = calc::calculate_document(&lines);
    Ok((lines, totals))
}

/// Loads a customer visible in `scope` (soft-deleted customers are not).
///
/// Out-of-scope and deleted customers answer `NotFound` so cross-tenant
/// probes cannot distinguish "hidden" from "absent".
pub(crate) async fn load_customer_in_scope<C: ConnectionTrait>(
    conn: &C,
    scope: &TenantScope,
    customer_id: Uuid,
) -> AppResult<customers::Model> {
    customers::Entity::find_by_id(customer_id)
        .filter(customer_visibility(scope))
        .one(conn)
        .await
        .map_err(crate::db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Customer {customer_id}")))
}
