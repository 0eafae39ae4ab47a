//! Order status transitions and fulfillment tracking.
//!
//! Staff may move a Pending order to Confirmed or Cancelled. The delivery
//! statuses are derived: confirming delivery notes against the order moves
//! it to PartiallyDelivered or FullyDelivered based on delivered versus
//! ordered quantities.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::{DocumentError, DocumentKind};
use super::types::OrderStatus;

/// Verifies that order fields and items may be modified.
///
/// # Errors
///
/// Returns [`DocumentError::NotEditable`] unless the order is Pending.
pub fn ensure_editable(status: OrderStatus) -> Result<(), DocumentError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(DocumentError::NotEditable {
            kind: DocumentKind::Order,
            status: status.as_str(),
        })
    }
}

/// Applies a direct status change request.
///
/// Only Pending→Confirmed and Pending→Cancelled are staff-settable; the
/// delivery statuses are reserved for [`apply_delivery`].
///
/// # Errors
///
/// Returns [`DocumentError`] for illegal or system-reserved transitions.
pub fn set_status(current: OrderStatus, target: OrderStatus) -> Result<OrderStatus, DocumentError> {
    use OrderStatus::{Cancelled, Confirmed, FullyDelivered, PartiallyDelivered, Pending};

    match (current, target) {
        (_, PartiallyDelivered | FullyDelivered) => Err(DocumentError::DeliveryProgressIsDerived),
        (Pending, Confirmed | Cancelled) => Ok(target),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::Order,
            from: current.as_str(),
            to: target.as_str(),
        }),
    }
}

/// Advances an order's delivery progress after a delivery note confirm.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidTransition`] when the order can no
/// longer accept deliveries (Cancelled, or already FullyDelivered).
pub fn apply_delivery(current: OrderStatus, fully: bool) -> Result<OrderStatus, DocumentError> {
    use OrderStatus::{FullyDelivered, PartiallyDelivered, Pending};

    let target = if fully {
        FullyDelivered
    } else {
        PartiallyDelivered
    };
    match current {
        Pending | PartiallyDelivered | OrderStatus::Confirmed => Ok(target),
        _ => Err(DocumentError::InvalidTransition {
            kind: DocumentKind::Order,
            from: current.as_str(),
            to: target.as_str(),
        }),
    }
}

/// Decides whether the delivered quantities cover the full order.
///
/// Quantities are aggregated per product; the order counts as fully
/// delivered once every ordered product's delivered sum reaches its
/// ordered sum.
#[must_use]
pub fn is_fully_delivered(
    ordered: &[(Uuid, Decimal)],
    delivered: &[(Uuid, Decimal)],
) -> bool {
    let mut remaining: HashMap<Uuid, Decimal> = HashMap::new();
    for (product, quantity) in ordered {
        *remaining.entry(*product).or_insert(Decimal::ZERO) += *quantity;
    }
    for (product, quantity) in delivered {
        if let Some(open) = remaining.get_mut(product) {
            *open -= *quantity;
        }
    }
    remaining.values().all(|open| *open <= Decimal::ZERO)
}
