//! Ledger domain types.
//!
//! Like the document statuses, every enum here crosses the wire as its
//! lowercase snake_case name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::InvoiceStatus;

/// Side of a customer account ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Reduces the firm's claim on the customer.
    Debit,
    /// Increases the firm's claim on the customer.
    Credit,
}

/// Direction of a cash register or bank account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashDirection {
    /// Money entering the register/account.
    In,
    /// Money leaving the register/account.
    Out,
}

/// What a payment event means for the firm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Money received from the customer.
    Collection,
    /// Money paid out to the customer.
    Payment,
}

/// Where the money moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Through a cash register.
    Cash,
    /// Through a bank account.
    Bank,
}

/// Direction of a stock ledger row. Quantities are always positive; the
/// direction is encoded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    /// Goods entering stock.
    In,
    /// Goods leaving stock.
    Out,
    /// Movement between locations; carried on the wire, not posted by
    /// this engine.
    Transfer,
}

/// What a ledger row refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// An issued invoice.
    Invoice,
    /// A collection from a customer.
    Collection,
    /// A payment out to a customer.
    Payment,
    /// A manual adjustment.
    Manual,
    /// An opening balance.
    Opening,
    /// A stocktake reconciliation.
    Stocktake,
    /// A confirmed delivery note.
    DeliveryNote,
}

macro_rules! wire_enum_impls {
    ($($name:ident { $($variant:ident => $text:literal),+ $(,)? })+) => {
        $(
            impl $name {
                /// Returns the stable wire name of this value.
                #[must_use]
                pub const fn as_str(self) -> &'static str {
                    match self {
                        $(Self::$variant => $text,)+
                    }
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl std::str::FromStr for $name {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    match s {
                        $($text => Ok(Self::$variant),)+
                        _ => Err(format!("Unknown {}: {s}", stringify!($name))),
                    }
                }
            }
        )+
    };
}

wire_enum_impls! {
    EntryType { Debit => "debit", Credit => "credit" }
    CashDirection { In => "in", Out => "out" }
    PaymentKind { Collection => "collection", Payment => "payment" }
    PaymentMethod { Cash => "cash", Bank => "bank" }
    StockMovementType { In => "in", Out => "out", Transfer => "transfer" }
    ReferenceType {
        Invoice => "invoice",
        Collection => "collection",
        Payment => "payment",
        Manual => "manual",
        Opening => "opening",
        Stocktake => "stocktake",
        DeliveryNote => "delivery_note",
    }
}

/// A payment command as received from the caller.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// The customer the payment settles with.
    pub customer_id: Uuid,
    /// The amount; must be positive.
    pub amount: Decimal,
    /// Collection or payment.
    pub kind: PaymentKind,
    /// Cash or bank.
    pub method: PaymentMethod,
    /// The cash register or bank account the money moves through.
    pub register_id: Uuid,
    /// An invoice to settle (collections only).
    pub invoice_id: Option<Uuid>,
    /// Free-text description carried onto the ledger rows.
    pub description: Option<String>,
}

/// The facts about a targeted invoice the planner needs, resolved by the
/// caller inside the posting transaction.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceFacts {
    /// The invoice ID.
    pub id: Uuid,
    /// The customer the invoice belongs to.
    pub customer_id: Uuid,
    /// The invoice's current status.
    pub status: InvoiceStatus,
}

/// The fan-out a validated payment resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    /// Direction of the cash/bank row.
    pub cash_direction: CashDirection,
    /// Side of the customer account row.
    pub account_entry: EntryType,
    /// Reference type stamped on both ledger rows.
    pub reference_type: ReferenceType,
    /// Invoice to transition to Paid, if the payment targets one.
    pub settle_invoice: Option<Uuid>,
}
