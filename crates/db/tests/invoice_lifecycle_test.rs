//! Invoice lifecycle and concurrency tests.
//!
//! Terminal statuses are immutable, Paid is reachable only through a
//! payment posting, and stale version tokens lose loudly.

mod common;

use defter_core::document::InvoiceStatus;
use defter_core::ledger::{PaymentKind, PaymentMethod, PaymentRequest};
use defter_core::scope::Role;
use defter_db::repositories::invoice::{CreateInvoiceInput, UpdateInvoiceInput};
use defter_db::repositories::NewLineItem;
use defter_db::{CustomerRepository, InvoiceRepository, PaymentRepository};
use rust_decimal_macros::dec;

fn two_lines() -> Vec<NewLineItem> {
    vec![
        NewLineItem {
            product_id: None,
            description: "Consulting".to_owned(),
            quantity: dec!(2),
            unit_price: dec!(100),
            vat_rate: dec!(20),
            discount_percent: dec!(0),
        },
        NewLineItem {
            product_id: None,
            description: "Travel".to_owned(),
            quantity: dec!(1),
            unit_price: dec!(50),
            vat_rate: dec!(20),
            discount_percent: dec!(50),
        },
    ]
}

#[tokio::test]
async fn totals_are_computed_never_accepted() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = InvoiceRepository::new(db.clone());
    let created = repo
        .create(
            &actor,
            CreateInvoiceInput {
                customer_id: customer.id,
                issue_date: common::today(),
                prefix: None,
                items: two_lines(),
            },
        )
        .await
        .unwrap();

    // 2x100 + 1x50 at 50% discount = 225.00; VAT 20% = 45.00.
    assert_eq!(created.invoice.sub_total, dec!(225.00));
    assert_eq!(created.invoice.total_vat, dec!(45.00));
    assert_eq!(created.invoice.grand_total, dec!(270.00));
    assert_eq!(created.invoice.status, "draft");
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.items[0].line_total_incl_vat, dec!(240.00));
    assert_eq!(created.items[1].line_total_incl_vat, dec!(30.00));
}

#[tokio::test]
async fn update_replaces_items_and_recomputes() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = InvoiceRepository::new(db.clone());
    let created = repo
        .create(
            &actor,
            CreateInvoiceInput {
                customer_id: customer.id,
                issue_date: common::today(),
                prefix: None,
                items: two_lines(),
            },
        )
        .await
        .unwrap();

    let updated = repo
        .update(
            &actor,
            UpdateInvoiceInput {
                invoice_id: created.invoice.id,
                row_version: Some(created.invoice.row_version),
                issue_date: None,
                items: common::flat_invoice_items(dec!(500)),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.invoice.grand_total, dec!(500.00));
    assert_eq!(updated.items.len(), 1);
    assert_ne!(updated.invoice.row_version, created.invoice.row_version);
}

#[tokio::test]
async fn stale_version_token_loses() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = InvoiceRepository::new(db.clone());
    let created = repo
        .create(
            &actor,
            CreateInvoiceInput {
                customer_id: customer.id,
                issue_date: common::today(),
                prefix: None,
                items: two_lines(),
            },
        )
        .await
        .unwrap();
    let loaded_version = created.invoice.row_version;

    // Two editors load the same version; the first write wins.
    let first = repo
        .update(
            &actor,
            UpdateInvoiceInput {
                invoice_id: created.invoice.id,
                row_version: Some(loaded_version),
                issue_date: None,
                items: common::flat_invoice_items(dec!(100)),
            },
        )
        .await;
    assert!(first.is_ok());

    let second = repo
        .update(
            &actor,
            UpdateInvoiceInput {
                invoice_id: created.invoice.id,
                row_version: Some(loaded_version),
                issue_date: None,
                items: common::flat_invoice_items(dec!(999)),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(second.error_code(), "CONCURRENCY_CONFLICT");

    // The losing write changed nothing.
    let reloaded = repo.get(&actor, created.invoice.id).await.unwrap();
    assert_eq!(reloaded.invoice.grand_total, dec!(100.00));
}

#[tokio::test]
async fn omitting_the_token_opts_into_last_writer_wins() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = InvoiceRepository::new(db.clone());
    let created = repo
        .create(
            &actor,
            CreateInvoiceInput {
                customer_id: customer.id,
                issue_date: common::today(),
                prefix: None,
                items: two_lines(),
            },
        )
        .await
        .unwrap();

    repo.update(
        &actor,
        UpdateInvoiceInput {
            invoice_id: created.invoice.id,
            row_version: Some(created.invoice.row_version),
            issue_date: None,
            items: common::flat_invoice_items(dec!(100)),
        },
    )
    .await
    .unwrap();

    // No token: the write goes through against the newer version.
    let result = repo
        .update(
            &actor,
            UpdateInvoiceInput {
                invoice_id: created.invoice.id,
                row_version: None,
                issue_date: None,
                items: common::flat_invoice_items(dec!(150)),
            },
        )
        .await
        .unwrap();
    assert_eq!(result.invoice.grand_total, dec!(150.00));
}

#[tokio::test]
async fn terminal_invoices_reject_updates_and_status_changes() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let register = common::seed_cash_register(&db, firm).await;

    let issued = common::issued_invoice(&db, &actor, customer.id, dec!(100)).await;

    // Settle it through a payment.
    let payments = PaymentRepository::new(db.clone());
    payments
        .post_payment(
            &actor,
            PaymentRequest {
                customer_id: customer.id,
                amount: dec!(100),
                kind: PaymentKind::Collection,
                method: PaymentMethod::Cash,
                register_id: register.id,
                invoice_id: Some(issued.invoice.id),
                description: None,
            },
        )
        .await
        .unwrap();

    let repo = InvoiceRepository::new(db.clone());
    let paid = repo.get(&actor, issued.invoice.id).await.unwrap();
    assert_eq!(paid.invoice.status, "paid");
    let totals_before = paid.invoice.grand_total;

    // Updates and most status changes now fail with StateConflict.
    let err = repo
        .update(
            &actor,
            UpdateInvoiceInput {
                invoice_id: paid.invoice.id,
                row_version: None,
                issue_date: None,
                items: common::flat_invoice_items(dec!(5)),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");

    let err = repo
        .set_status(&actor, paid.invoice.id, InvoiceStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");

    // The idempotent no-op is the one accepted repeat.
    let noop = repo
        .set_status(&actor, paid.invoice.id, InvoiceStatus::Paid, None)
        .await
        .unwrap();
    assert_eq!(noop.status, "paid");
    assert_eq!(noop.row_version, paid.invoice.row_version);

    let reloaded = repo.get(&actor, paid.invoice.id).await.unwrap();
    assert_eq!(reloaded.invoice.grand_total, totals_before);
}

#[tokio::test]
async fn paid_is_unreachable_without_a_payment() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let issued = common::issued_invoice(&db, &actor, customer.id, dec!(100)).await;

    let repo = InvoiceRepository::new(db.clone());
    let err = repo
        .set_status(&actor, issued.invoice.id, InvoiceStatus::Paid, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");
}

#[tokio::test]
async fn issue_and_cancel_keep_the_ledger_balanced() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let customers = CustomerRepository::new(db.clone());
    let issued = common::issued_invoice(&db, &actor, customer.id, dec!(800)).await;
    assert_eq!(customers.balance(&actor, customer.id).await.unwrap(), dec!(800));

    // Cancelling the issued invoice posts the offsetting row.
    let repo = InvoiceRepository::new(db.clone());
    repo.set_status(&actor, issued.invoice.id, InvoiceStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(
        customers.balance(&actor, customer.id).await.unwrap(),
        dec!(0)
    );

    let statement = customers.statement(&actor, customer.id).await.unwrap();
    assert_eq!(statement.len(), 2);
}

#[tokio::test]
async fn cross_tenant_invoices_are_invisible() {
    let db = common::setup().await;
    let firm_a = common::seed_firm(&db, "Acme").await;
    let firm_b = common::seed_firm(&db, "Initech").await;
    let owner = common::seed_user(&db, firm_a, Role::FirmAdmin).await;
    let outsider = common::seed_user(&db, firm_b, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &owner, "Pied Piper").await;

    let issued = common::issued_invoice(&db, &owner, customer.id, dec!(100)).await;

    let repo = InvoiceRepository::new(db.clone());
    let err = repo.get(&outsider, issued.invoice.id).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    let page = repo
        .list(
            &outsider,
            defter_db::repositories::invoice::InvoiceFilter::default(),
            &defter_shared::types::PageRequest::default(),
        )
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.meta.total, 0);
}

#[tokio::test]
async fn soft_deleted_customers_cannot_be_invoiced() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let customers = CustomerRepository::new(db.clone());
    customers.soft_delete(&actor, customer.id).await.unwrap();

    let repo = InvoiceRepository::new(db.clone());
    let err = repo
        .create(
            &actor,
            CreateInvoiceInput {
                customer_id: customer.id,
                issue_date: common::today(),
                prefix: None,
                items: two_lines(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    // The tombstone is invisible on every read path.
    assert!(customers.get(&actor, customer.id).await.is_err());
    let page = customers
        .list(&actor, &defter_shared::types::PageRequest::default())
        .await
        .unwrap();
    assert!(page.data.is_empty());
}
