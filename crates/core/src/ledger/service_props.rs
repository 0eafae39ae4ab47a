//! Property tests for ledger posting plans and balance folds.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::{account_balance, running_balances, stock_level};
use super::service::LedgerService;
use super::types::{
    CashDirection, EntryType, PaymentKind, PaymentMethod, PaymentRequest, StockMovementType,
};

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=100_000_000).prop_map(|n| Decimal::new(n, 2))
}

fn entry_strategy() -> impl Strategy<Value = (EntryType, Decimal)> {
    (
        prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)],
        amount_strategy(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Collections always plan money In and a Debit; payments always plan
    /// money Out and a Credit; the two sides never mix.
    #[test]
    fn prop_payment_plan_directions(amount in amount_strategy(), collect in any::<bool>()) {
        let kind = if collect { PaymentKind::Collection } else { PaymentKind::Payment };
        let request = PaymentRequest {
            customer_id: Uuid::new_v4(),
            amount,
            kind,
            method: PaymentMethod::Bank,
            register_id: Uuid::new_v4(),
            invoice_id: None,
            description: None,
        };
        let plan = LedgerService::plan_payment(&request, None).unwrap();

        match kind {
            PaymentKind::Collection => {
                prop_assert_eq!(plan.cash_direction, CashDirection::In);
                prop_assert_eq!(plan.account_entry, EntryType::Debit);
            }
            PaymentKind::Payment => {
                prop_assert_eq!(plan.cash_direction, CashDirection::Out);
                prop_assert_eq!(plan.account_entry, EntryType::Credit);
            }
        }
    }

    /// The account balance fold equals credits minus debits, however the
    /// rows are ordered.
    #[test]
    fn prop_account_balance_is_credit_minus_debit(
        entries in proptest::collection::vec(entry_strategy(), 0..32),
    ) {
        let credits: Decimal = entries
            .iter()
            .filter(|(t, _)| *t == EntryType::Credit)
            .map(|(_, a)| *a)
            .sum();
        let debits: Decimal = entries
            .iter()
            .filter(|(t, _)| *t == EntryType::Debit)
            .map(|(_, a)| *a)
            .sum();

        prop_assert_eq!(account_balance(entries), credits - debits);
    }

    /// The last running balance equals the total balance, and each step
    /// moves by exactly the row's signed amount.
    #[test]
    fn prop_running_balances_consistent(
        entries in proptest::collection::vec(entry_strategy(), 1..32),
    ) {
        let total = account_balance(entries.clone());
        let running = running_balances(entries.clone());

        prop_assert_eq!(running.len(), entries.len());
        prop_assert_eq!(*running.last().unwrap(), total);

        let mut previous = Decimal::ZERO;
        for ((entry, amount), balance) in entries.into_iter().zip(running) {
            let expected = match entry {
                EntryType::Credit => previous + amount,
                EntryType::Debit => previous - amount,
            };
            prop_assert_eq!(balance, expected);
            previous = balance;
        }
    }

    /// Stock conservation: any sequence of planned movements applied to
    /// the counter keeps counter == Σ in − Σ out, and the counter never
    /// goes negative.
    #[test]
    fn prop_stock_counter_conserved(
        quantities in proptest::collection::vec((any::<bool>(), 1i64..=1000), 0..32),
    ) {
        let mut counter = Decimal::ZERO;
        let mut ledger: Vec<(StockMovementType, Decimal)> = Vec::new();

        for (incoming, quantity) in quantities {
            let quantity = Decimal::from(quantity);
            let movement = if incoming { StockMovementType::In } else { StockMovementType::Out };
            match LedgerService::plan_stock_movement(movement, quantity, counter) {
                Ok(new_level) => {
                    counter = new_level;
                    ledger.push((movement, quantity));
                }
                Err(_) => {
                    // Rejected movements must leave no trace.
                }
            }
            prop_assert!(counter >= Decimal::ZERO);
            prop_assert_eq!(counter, stock_level(ledger.iter().copied()));
        }
    }

    /// A stocktake always reconciles: applying the delta movement to the
    /// counter lands exactly on the counted value.
    #[test]
    fn prop_stocktake_reconciles(
        current in 0i64..=10_000,
        counted in 0i64..=10_000,
    ) {
        let current = Decimal::from(current);
        let counted = Decimal::from(counted);

        match LedgerService::stocktake_delta(current, counted).unwrap() {
            None => prop_assert_eq!(current, counted),
            Some((movement, quantity)) => {
                prop_assert!(quantity > Decimal::ZERO);
                let applied =
                    LedgerService::plan_stock_movement(movement, quantity, current).unwrap();
                prop_assert_eq!(applied, counted);
            }
        }
    }
}
