//! Property tests for the document state machines.

use proptest::prelude::*;

use super::delivery_note;
use super::error::DocumentError;
use super::invoice;
use super::order;
use super::types::{DeliveryNoteStatus, InvoiceStatus, OrderStatus};

fn invoice_status_strategy() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Issued),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Cancelled),
    ]
}

fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Confirmed),
        Just(OrderStatus::PartiallyDelivered),
        Just(OrderStatus::FullyDelivered),
        Just(OrderStatus::Cancelled),
    ]
}

fn note_status_strategy() -> impl Strategy<Value = DeliveryNoteStatus> {
    prop_oneof![
        Just(DeliveryNoteStatus::Draft),
        Just(DeliveryNoteStatus::Confirmed),
        Just(DeliveryNoteStatus::Cancelled),
        Just(DeliveryNoteStatus::Invoiced),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Terminal invoices accept no status change except the idempotent
    /// Paid→Paid no-op, and the no-op never reports a change.
    #[test]
    fn prop_terminal_invoices_immutable(
        from in invoice_status_strategy(),
        to in invoice_status_strategy(),
    ) {
        if from.is_terminal() {
            match invoice::set_status(from, to) {
                Ok(change) => {
                    prop_assert_eq!(from, InvoiceStatus::Paid);
                    prop_assert_eq!(to, InvoiceStatus::Paid);
                    prop_assert!(!change.changed);
                }
                Err(_) => {}
            }
            prop_assert!(invoice::ensure_editable(from).is_err());
        }
    }

    /// Successful transitions always land on the requested status.
    #[test]
    fn prop_transitions_land_on_target(
        from in invoice_status_strategy(),
        to in invoice_status_strategy(),
    ) {
        if let Ok(change) = invoice::set_status(from, to) {
            prop_assert_eq!(change.status, to);
        }
    }

    /// Delivery progress can never be set through the staff status API.
    #[test]
    fn prop_delivery_progress_reserved(from in order_status_strategy()) {
        for target in [OrderStatus::PartiallyDelivered, OrderStatus::FullyDelivered] {
            prop_assert_eq!(
                order::set_status(from, target),
                Err(DocumentError::DeliveryProgressIsDerived)
            );
        }
    }

    /// Only Pending orders are editable, and only Pending orders accept a
    /// staff status change.
    #[test]
    fn prop_non_pending_orders_locked(
        from in order_status_strategy(),
        to in order_status_strategy(),
    ) {
        if from != OrderStatus::Pending {
            prop_assert!(order::ensure_editable(from).is_err());
            prop_assert!(order::set_status(from, to).is_err());
        }
    }

    /// An invoice-linked note refuses every operation, whatever its status.
    #[test]
    fn prop_invoiced_note_frozen(status in note_status_strategy()) {
        prop_assert!(delivery_note::ensure_editable(status, true).is_err());
        prop_assert!(delivery_note::confirm(status, true).is_err());
        prop_assert!(delivery_note::cancel(status, true).is_err());
        prop_assert!(delivery_note::mark_invoiced(status, true).is_err());
    }

    /// Confirm never regresses a note: the outcome of a legal confirm is
    /// Confirmed semantics whether it is the first or a repeat call.
    #[test]
    fn prop_confirm_sticky(status in note_status_strategy()) {
        match delivery_note::confirm(status, false) {
            Ok(delivery_note::ConfirmOutcome::Confirmed) => {
                prop_assert_eq!(status, DeliveryNoteStatus::Draft);
            }
            Ok(delivery_note::ConfirmOutcome::AlreadyConfirmed) => {
                prop_assert_eq!(status, DeliveryNoteStatus::Confirmed);
            }
            Err(_) => prop_assert!(matches!(
                status,
                DeliveryNoteStatus::Cancelled | DeliveryNoteStatus::Invoiced
            )),
        }
    }
}
