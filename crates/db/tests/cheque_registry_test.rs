//! Cheque/promissory portfolio tests.
//!
//! The transition set is deliberately permissive; tenancy and input
//! validation still hold.

mod common;

use chrono::Days;
use defter_core::document::{ChequeKind, ChequeStatus};
use defter_core::scope::Role;
use defter_db::repositories::cheque::{ChequeFilter, CreateChequeInput};
use defter_db::ChequeRepository;
use defter_shared::types::PageRequest;
use rust_decimal_macros::dec;

fn input(customer_id: Option<uuid::Uuid>, serial: &str, due: chrono::NaiveDate) -> CreateChequeInput {
    CreateChequeInput {
        customer_id,
        document_kind: ChequeKind::Cheque,
        serial_number: serial.to_owned(),
        bank_name: Some("Ziraat".to_owned()),
        amount: dec!(1500),
        due_date: due,
    }
}

#[tokio::test]
async fn any_status_can_follow_any_status() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = ChequeRepository::new(db.clone());
    let cheque = repo
        .create(&actor, input(Some(customer.id), "A-001", common::today()))
        .await
        .unwrap();
    assert_eq!(cheque.status, "in_portfolio");

    // Rejected, then back into the portfolio, then collected: all legal.
    for target in [
        ChequeStatus::Rejected,
        ChequeStatus::InPortfolio,
        ChequeStatus::Collected,
        ChequeStatus::Paid,
    ] {
        let updated = repo.set_status(&actor, cheque.id, target).await.unwrap();
        assert_eq!(updated.status, target.as_str());
    }
}

#[tokio::test]
async fn listing_filters_by_status_and_due_date() {
    let db = common::setup().await;
    let firm = common::seed_firm(&db, "Acme").await;
    let actor = common::seed_user(&db, firm, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &actor, "Pied Piper").await;

    let repo = ChequeRepository::new(db.clone());
    let today = common::today();
    let soon = repo
        .create(&actor, input(Some(customer.id), "A-001", today))
        .await
        .unwrap();
    let later = repo
        .create(
            &actor,
            input(
                Some(customer.id),
                "A-002",
                today.checked_add_days(Days::new(60)).unwrap(),
            ),
        )
        .await
        .unwrap();
    repo.set_status(&actor, later.id, ChequeStatus::Collected)
        .await
        .unwrap();

    let due_now = repo
        .list(
            &actor,
            ChequeFilter {
                status: None,
                due_before: today.checked_add_days(Days::new(30)),
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(due_now.data.len(), 1);
    assert_eq!(due_now.data[0].id, soon.id);

    let collected = repo
        .list(
            &actor,
            ChequeFilter {
                status: Some(ChequeStatus::Collected),
                due_before: None,
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(collected.data.len(), 1);
    assert_eq!(collected.data[0].id, later.id);
}

#[tokio::test]
async fn validation_and_tenancy_hold() {
    let db = common::setup().await;
    let firm_a = common::seed_firm(&db, "Acme").await;
    let firm_b = common::seed_firm(&db, "Initech").await;
    let owner = common::seed_user(&db, firm_a, Role::FirmAdmin).await;
    let outsider = common::seed_user(&db, firm_b, Role::FirmAdmin).await;
    let customer = common::seed_customer(&db, &owner, "Pied Piper").await;

    let repo = ChequeRepository::new(db.clone());

    let mut bad = input(Some(customer.id), "A-001", common::today());
    bad.amount = dec!(0);
    let err = repo.create(&owner, bad).await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let mut blank = input(Some(customer.id), "  ", common::today());
    blank.serial_number = "  ".to_owned();
    let err = repo.create(&owner, blank).await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    let cheque = repo
        .create(&owner, input(Some(customer.id), "A-001", common::today()))
        .await
        .unwrap();

    // Invisible across the tenant boundary.
    let err = repo.get(&outsider, cheque.id).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
    let err = repo
        .set_status(&outsider, cheque.id, ChequeStatus::Paid)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}
