//! Delivery note lifecycle tests.
//!
//! Confirming posts stock exactly once; cancellation works only on
//! drafts; conversion to an invoice freezes the note; confirming against
//! an order advances its delivery progress.

mod common;

use defter_core::scope::Role;
use defter_db::entities::{products, stock_movements};
use defter_db::repositories::delivery_note::{CreateNoteInput, NewNoteItem, UpdateNoteInput};
use defter_db::repositories::order::CreateOrderInput;
use defter_db::repositories::NewLineItem;
use defter_db::{DeliveryNoteRepository, OrderRepository};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

async fn stock_of(db: &sea_orm::DatabaseConnection, product_id: Uuid) -> Decimal {
    products::Entity::find_by_id(product_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

async fn movements_for(db: &sea_orm::DatabaseConnection, note_id: Uuid) -> u64 {
    stock_movements::Entity::find()
        .filter(stock_movements::Column::ReferenceId.eq(note_id))
        .count(db)
        .await
        .unwrap()
}

fn note_input(customer_id: Uuid, items: Vec<NewNoteItem>) -> CreateNoteInput {
    CreateNoteInput {
        customer_id,
        order_id: None,
        note_date: common::today(),
        items,
    }
}

fn line(product_id: Uuid, quantity: Decimal) -> NewNoteItem {
    NewNoteItem {
        product_id,
        description: "Delivered goods".to_owned(),
        quantity,
    }
}

#[tokio::test]
async fn double_confirm_posts_stock_exactly_once() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(10)).await;
    let ink = common::seed_product(&db, firm, "Ink", dec!(8), dec!(20), dec!(8)).await;

    let repo = DeliveryNoteRepository::new(db.clone());
    let note = repo
        .create(
            &actor,
            note_input(customer.id, vec![line(pens.id, dec!(2)), line(ink.id, dec!(3))]),
        )
        .await
        .unwrap();

    let confirmed = repo.confirm(&actor, note.note.id).await.unwrap();
    assert_eq!(confirmed.status, "confirmed");
    assert_eq!(movements_for(&db, note.note.id).await, 2);
    assert_eq!(stock_of(&db, pens.id).await, dec!(8));
    assert_eq!(stock_of(&db, ink.id).await, dec!(5));

    // Second confirm: accepted, nothing moves.
    let again = repo.confirm(&actor, note.note.id).await.unwrap();
    assert_eq!(again.status, "confirmed");
    assert_eq!(movements_for(&db, note.note.id).await, 2);
    assert_eq!(stock_of(&db, pens.id).await, dec!(8));
    assert_eq!(stock_of(&db, ink.id).await, dec!(5));
}

#[tokio::test]
async fn failed_confirm_rolls_back_everything() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(10)).await;
    let ink = common::seed_product(&db, firm, "Ink", dec!(8), dec!(20), dec!(1)).await;

    let repo = DeliveryNoteRepository::new(db.clone());
    let note = repo
        .create(
            &actor,
            // First line has cover, second does not.
            note_input(customer.id, vec![line(pens.id, dec!(2)), line(ink.id, dec!(5))]),
        )
        .await
        .unwrap();

    let err = repo.confirm(&actor, note.note.id).await.unwrap_err();
    assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");

    // The whole confirm rolled back: status, counters, and movements.
    let reloaded = repo.get(&actor, note.note.id).await.unwrap();
    assert_eq!(reloaded.note.status, "draft");
    assert_eq!(movements_for(&db, note.note.id).await, 0);
    assert_eq!(stock_of(&db, pens.id).await, dec!(10));
    assert_eq!(stock_of(&db, ink.id).await, dec!(1));
}

#[tokio::test]
async fn cancel_only_from_draft() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(10)).await;

    let repo = DeliveryNoteRepository::new(db.clone());
    let note = repo
        .create(&actor, note_input(customer.id, vec![line(pens.id, dec!(1))]))
        .await
        .unwrap();
    repo.confirm(&actor, note.note.id).await.unwrap();

    let err = repo.cancel(&actor, note.note.id, None).await.unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");

    let other = repo
        .create(&actor, note_input(customer.id, vec![line(pens.id, dec!(1))]))
        .await
        .unwrap();
    let cancelled = repo.cancel(&actor, other.note.id, None).await.unwrap();
    assert_eq!(cancelled.status, "cancelled");

    // A cancelled note cannot be confirmed afterwards.
    let err = repo.confirm(&actor, other.note.id).await.unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");
}

#[tokio::test]
async fn conversion_freezes_the_note_and_prices_from_catalog() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(50)).await;

    let repo = DeliveryNoteRepository::new(db.clone());
    let note = repo
        .create(&actor, note_input(customer.id, vec![line(pens.id, dec!(4))]))
        .await
        .unwrap();
    repo.confirm(&actor, note.note.id).await.unwrap();

    let invoice = repo
        .convert_to_invoice(&actor, note.note.id, None)
        .await
        .unwrap();

    // 4 x 5.00 + 20% VAT.
    assert_eq!(invoice.invoice.sub_total, dec!(20.00));
    assert_eq!(invoice.invoice.total_vat, dec!(4.00));
    assert_eq!(invoice.invoice.grand_total, dec!(24.00));
    assert_eq!(invoice.invoice.status, "draft");
    assert_eq!(invoice.items.len(), 1);

    let reloaded = repo.get(&actor, note.note.id).await.unwrap();
    assert_eq!(reloaded.note.status, "invoiced");
    assert_eq!(reloaded.note.invoice_id, Some(invoice.invoice.id));

    // Terminal: no second conversion, no edits.
    let err = repo
        .convert_to_invoice(&actor, note.note.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");

    let err = repo
        .update(
            &actor,
            UpdateNoteInput {
                note_id: note.note.id,
                row_version: None,
                note_date: None,
                items: vec![line(pens.id, dec!(9))],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");
}

#[tokio::test]
async fn unconfirmed_note_cannot_convert() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(10)).await;

    let repo = DeliveryNoteRepository::new(db.clone());
    let note = repo
        .create(&actor, note_input(customer.id, vec![line(pens.id, dec!(1))]))
        .await
        .unwrap();

    let err = repo
        .convert_to_invoice(&actor, note.note.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");
}

#[tokio::test]
async fn confirming_notes_advances_order_fulfillment() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;
    let pens = common::seed_product(&db, firm, "Pen", dec!(5), dec!(20), dec!(100)).await;

    let orders = OrderRepository::new(db.clone());
    let order = orders
        .create(
            &actor,
            CreateOrderInput {
                customer_id: customer.id,
                order_date: common::today(),
                items: vec![NewLineItem {
                    product_id: Some(pens.id),
                    description: "Pens".to_owned(),
                    quantity: dec!(10),
                    unit_price: dec!(5),
                    vat_rate: dec!(20),
                    discount_percent: dec!(0),
                }],
            },
        )
        .await
        .unwrap();

    let notes = DeliveryNoteRepository::new(db.clone());
    let first = notes
        .create(
            &actor,
            CreateNoteInput {
                customer_id: customer.id,
                order_id: Some(order.order.id),
                note_date: common::today(),
                items: vec![line(pens.id, dec!(4))],
            },
        )
        .await
        .unwrap();
    notes.confirm(&actor, first.note.id).await.unwrap();

    let after_first = orders.get(&actor, order.order.id).await.unwrap();
    assert_eq!(after_first.order.status, "partially_delivered");

    let second = notes
        .create(
            &actor,
            CreateNoteInput {
                customer_id: customer.id,
                order_id: Some(order.order.id),
                note_date: common::today(),
                items: vec![line(pens.id, dec!(6))],
            },
        )
        .await
        .unwrap();
    notes.confirm(&actor, second.note.id).await.unwrap();

    let after_second = orders.get(&actor, order.order.id).await.unwrap();
    assert_eq!(after_second.order.status, "fully_delivered");

    // A fully delivered order accepts no further notes.
    let err = notes
        .create(
            &actor,
            CreateNoteInput {
                customer_id: customer.id,
                order_id: Some(order.order.id),
                note_date: common::today(),
                items: vec![line(pens.id, dec!(1))],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "STATE_CONFLICT");
}
