//! Document status types.
//!
//! Every status crosses the wire as its lowercase snake_case name: one
//! stable representation for serialization, persistence, and parsing.

use serde::{Deserialize, Serialize};

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being drafted; fully editable.
    Draft,
    /// Issued to the customer; still editable, collectable by payments.
    Issued,
    /// Settled by a payment posting. Terminal.
    Paid,
    /// Cancelled before settlement. Terminal.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the stable wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if invoice fields and items may still change.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::Issued)
    }

    /// Returns true if the status permits no further edits.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, awaiting handling; the only editable status.
    Pending,
    /// Explicitly confirmed by staff.
    Confirmed,
    /// Some ordered quantities delivered via delivery notes.
    PartiallyDelivered,
    /// All ordered quantities delivered.
    FullyDelivered,
    /// Cancelled before handling.
    Cancelled,
}

impl OrderStatus {
    /// Returns the stable wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::PartiallyDelivered => "partially_delivered",
            Self::FullyDelivered => "fully_delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if order fields and items may still change.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Delivery note status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryNoteStatus {
    /// Being drafted; the only editable status.
    Draft,
    /// Goods handed over; stock has been posted. Sticky.
    Confirmed,
    /// Cancelled while still a draft.
    Cancelled,
    /// Converted to an invoice. Terminal.
    Invoiced,
}

impl DeliveryNoteStatus {
    /// Returns the stable wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Invoiced => "invoiced",
        }
    }

    /// Returns true if note fields and items may still change.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }
}

/// Cheque or promissory note status.
///
/// The transition set is deliberately unconstrained: the portfolio
/// workflow in the field moves documents back and forth (a rejected cheque
/// can return to the portfolio and be collected later), so any status can
/// be set from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChequeStatus {
    /// Held in the firm's portfolio.
    InPortfolio,
    /// Collected at the bank.
    Collected,
    /// Endorsed/paid out.
    Paid,
    /// Bounced or refused.
    Rejected,
}

impl ChequeStatus {
    /// Returns the stable wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InPortfolio => "in_portfolio",
            Self::Collected => "collected",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }
}


/// Kind of a portfolio document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChequeKind {
    /// A bank cheque.
    Cheque,
    /// A promissory note.
    Promissory,
}

impl ChequeKind {
    /// Returns the stable wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cheque => "cheque",
            Self::Promissory => "promissory",
        }
    }
}

macro_rules! status_string_impls {
    ($($status:ident { $($variant:ident),+ $(,)? })+) => {
        $(
            impl std::fmt::Display for $status {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl std::str::FromStr for $status {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    $(
                        if s == Self::$variant.as_str() {
                            return Ok(Self::$variant);
                        }
                    )+
                    Err(format!("Unknown {} status: {s}", stringify!($status)))
                }
            }
        )+
    };
}

status_string_impls! {
    InvoiceStatus { Draft, Issued, Paid, Cancelled }
    OrderStatus { Pending, Confirmed, PartiallyDelivered, FullyDelivered, Cancelled }
    DeliveryNoteStatus { Draft, Confirmed, Cancelled, Invoiced }
    ChequeStatus { InPortfolio, Collected, Paid, Rejected }
    ChequeKind { Cheque, Promissory }
}
