//! Payment and stock posting plans.
//!
//! The service is pure: callers resolve the facts (invoice row, current
//! stock level) inside their transaction and pass them in, the service
//! validates and answers with the plan to execute. This keeps every
//! posting rule testable without a database.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{
    CashDirection, EntryType, InvoiceFacts, PaymentKind, PaymentPlan, PaymentRequest,
    ReferenceType, StockMovementType,
};
use crate::document::InvoiceStatus;

/// Stateless ledger posting service.
pub struct LedgerService;

impl LedgerService {
    /// Validates a payment command and derives its posting plan.
    ///
    /// The plan fans out into one cash/bank row, one customer account row,
    /// and optionally an invoice settlement:
    ///
    /// - Collection: money In, account Debit (the claim shrinks).
    /// - Payment: money Out, account Credit (the claim grows).
    ///
    /// A targeted invoice must be resolved by the caller and passed as
    /// `invoice`; it must belong to the paying customer and be Issued.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the command is invalid; nothing may be
    /// posted in that case.
    pub fn plan_payment(
        request: &PaymentRequest,
        invoice: Option<&InvoiceFacts>,
    ) -> Result<PaymentPlan, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount);
        }

        let settle_invoice = match request.invoice_id {
            None => None,
            Some(invoice_id) => {
                if request.kind != PaymentKind::Collection {
                    return Err(LedgerError::InvoiceTargetRequiresCollection);
                }
                let facts = invoice.ok_or(LedgerError::InvoiceNotFound(invoice_id))?;
                if facts.customer_id != request.customer_id {
                    return Err(LedgerError::InvoiceCustomerMismatch);
                }
                if facts.status != InvoiceStatus::Issued {
                    return Err(LedgerError::InvoiceNotCollectable {
                        status: facts.status,
                    });
                }
                Some(facts.id)
            }
        };

        let (cash_direction, account_entry, reference_type) = match request.kind {
            PaymentKind::Collection => (
                CashDirection::In,
                EntryType::Debit,
                ReferenceType::Collection,
            ),
            PaymentKind::Payment => (
                CashDirection::Out,
                EntryType::Credit,
                ReferenceType::Payment,
            ),
        };

        Ok(PaymentPlan {
            cash_direction,
            account_entry,
            reference_type,
            settle_invoice,
        })
    }

    /// Validates a stock movement and computes the new counter value.
    ///
    /// Withdrawals must not take the counter below zero; the persistence
    /// layer additionally guards the counter update against concurrent
    /// withdrawals.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] for non-positive quantities, transfers, and
    /// insufficient stock.
    pub fn plan_stock_movement(
        movement_type: StockMovementType,
        quantity: Decimal,
        current_stock: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveQuantity);
        }
        match movement_type {
            StockMovementType::In => Ok(current_stock + quantity),
            StockMovementType::Out => {
                if quantity > current_stock {
                    return Err(LedgerError::InsufficientStock {
                        available: current_stock,
                        requested: quantity,
                    });
                }
                Ok(current_stock - quantity)
            }
            StockMovementType::Transfer => {
                Err(LedgerError::UnsupportedMovement(StockMovementType::Transfer))
            }
        }
    }

    /// Derives the reconciliation movement for a stocktake.
    ///
    /// Returns `None` when the count matches the counter (nothing to
    /// post); otherwise the In/Out movement that brings the counter to
    /// the counted value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeStocktake`] for negative counts.
    pub fn stocktake_delta(
        current_stock: Decimal,
        counted: Decimal,
    ) -> Result<Option<(StockMovementType, Decimal)>, LedgerError> {
        if counted.is_sign_negative() {
            return Err(LedgerError::NegativeStocktake);
        }
        let diff = counted - current_stock;
        if diff.is_zero() {
            Ok(None)
        } else if diff > Decimal::ZERO {
            Ok(Some((StockMovementType::In, diff)))
        } else {
            Ok(Some((StockMovementType::Out, -diff)))
        }
    }
}
