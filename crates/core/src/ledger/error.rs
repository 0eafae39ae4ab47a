//! Ledger posting errors.

use defter_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::document::InvoiceStatus;
use crate::ledger::types::StockMovementType;

/// Errors that can occur while planning or posting ledger events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Amounts on ledger rows must be positive.
    #[error("Amount must be positive")]
    NonPositiveAmount,

    /// Stock quantities must be positive; direction comes from the type.
    #[error("Quantity must be positive")]
    NonPositiveQuantity,

    /// The targeted invoice does not exist (or is not visible).
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// The targeted invoice belongs to a different customer.
    #[error("Invoice does not belong to the paying customer")]
    InvoiceCustomerMismatch,

    /// Only issued invoices can be settled.
    #[error("Invoice in status {status} cannot be settled; it must be issued")]
    InvoiceNotCollectable {
        /// The invoice's actual status.
        status: InvoiceStatus,
    },

    /// Outgoing payments cannot settle an invoice.
    #[error("Only collections may target an invoice")]
    InvoiceTargetRequiresCollection,

    /// Transfers are carried on the wire but not posted by this engine.
    #[error("Stock movement type {0} is not posted by this engine")]
    UnsupportedMovement(StockMovementType),

    /// Stocktake counts cannot be negative.
    #[error("Counted stock cannot be negative")]
    NegativeStocktake,

    /// A withdrawal would take the stock counter below zero.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        /// Quantity currently on hand.
        available: Decimal,
        /// Quantity the caller attempted to withdraw.
        requested: Decimal,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::NonPositiveQuantity => "NON_POSITIVE_QUANTITY",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvoiceCustomerMismatch => "INVOICE_CUSTOMER_MISMATCH",
            Self::InvoiceNotCollectable { .. } => "INVOICE_NOT_COLLECTABLE",
            Self::InvoiceTargetRequiresCollection => "INVOICE_TARGET_REQUIRES_COLLECTION",
            Self::UnsupportedMovement(_) => "UNSUPPORTED_MOVEMENT",
            Self::NegativeStocktake => "NEGATIVE_STOCKTAKE",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            // A bad invoice target is a validation failure of the payment
            // command, not a state conflict of the posting itself.
            other => Self::Validation(other.to_string()),
        }
    }
}
