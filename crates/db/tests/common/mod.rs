//! Shared test fixtures.
//!
//! Integration tests run the real migration and repositories against an
//! in-memory SQLite database (single connection, so every test sees one
//! coherent store). Fixtures are inserted directly through the entities,
//! the way the outer administration layers would.

#![allow(dead_code)]

use chrono::Utc;
use defter_core::document::InvoiceStatus;
use defter_core::scope::{Actor, Role};
use defter_db::entities::{
    bank_accounts, cash_registers, customers, firms, products, users,
};
use defter_db::migration::{Migrator, MigratorTrait};
use defter_shared::types::{FirmId, UserId};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set,
};
use uuid::Uuid;

pub fn timestamp() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Connects to a fresh in-memory database and runs the migration.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migration");
    db
}

pub async fn seed_firm(db: &DatabaseConnection, name: &str) -> FirmId {
    let id = Uuid::new_v4();
    firms::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed firm");
    FirmId::from_uuid(id)
}

pub async fn seed_user(db: &DatabaseConnection, firm: FirmId, role: Role) -> Actor {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        firm_id: Set(Some(firm.into_inner())),
        email: Set(format!("user-{id}@example.test")),
        display_name: Set("Test User".to_owned()),
        role: Set(match role {
            Role::SuperOperator => "super_operator".to_owned(),
            Role::FirmAdmin => "firm_admin".to_owned(),
            Role::Employee => "employee".to_owned(),
        }),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed user");
    Actor::firm_member(UserId::from_uuid(id), role, firm)
}

pub async fn seed_customer(db: &DatabaseConnection, actor: &Actor, name: &str) -> customers::Model {
    customers::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(actor.firm_id.expect("firm-bound actor").into_inner()),
        owner_user_id: Set(actor.user_id.into_inner()),
        name: Set(name.to_owned()),
        email: Set(None),
        phone: Set(None),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed customer")
}

pub async fn seed_product(
    db: &DatabaseConnection,
    firm: FirmId,
    name: &str,
    unit_price: Decimal,
    vat_rate: Decimal,
    stock: Decimal,
) -> products::Model {
    products::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(firm.into_inner()),
        name: Set(name.to_owned()),
        sku: Set(None),
        unit_price: Set(unit_price),
        vat_rate: Set(vat_rate),
        stock_quantity: Set(stock),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed product")
}

pub async fn seed_cash_register(db: &DatabaseConnection, firm: FirmId) -> cash_registers::Model {
    cash_registers::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(firm.into_inner()),
        name: Set("Main till".to_owned()),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed cash register")
}

pub async fn seed_bank_account(db: &DatabaseConnection, firm: FirmId) -> bank_accounts::Model {
    bank_accounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        firm_id: Set(firm.into_inner()),
        name: Set("Current account".to_owned()),
        iban: Set(Some("TR00 0000 0000 0000 0000 0000 00".to_owned())),
        created_at: Set(timestamp()),
        updated_at: Set(timestamp()),
    }
    .insert(db)
    .await
    .expect("seed bank account")
}

/// A single-line invoice input with a flat amount and no VAT, handy for
/// balance arithmetic in scenarios.
pub fn flat_invoice_items(amount: Decimal) -> Vec<defter_db::repositories::NewLineItem> {
    vec![defter_db::repositories::NewLineItem {
        product_id: None,
        description: "Services rendered".to_owned(),
        quantity: Decimal::ONE,
        unit_price: amount,
        vat_rate: Decimal::ZERO,
        discount_percent: Decimal::ZERO,
    }]
}

/// Creates and issues a flat invoice, returning the issued model.
pub async fn issued_invoice(
    db: &DatabaseConnection,
    actor: &Actor,
    customer_id: Uuid,
    amount: Decimal,
) -> defter_db::repositories::invoice::InvoiceWithItems {
    let repo = defter_db::InvoiceRepository::new(db.clone());
    let created = repo
        .create(
            actor,
            defter_db::repositories::invoice::CreateInvoiceInput {
                customer_id,
                issue_date: today(),
                prefix: None,
                items: flat_invoice_items(amount),
            },
        )
        .await
        .expect("create invoice");
    let issued = repo
        .set_status(actor, created.invoice.id, InvoiceStatus::Issued, None)
        .await
        .expect("issue invoice");
    defter_db::repositories::invoice::InvoiceWithItems {
        invoice: issued,
        items: created.items,
    }
}

pub fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}
