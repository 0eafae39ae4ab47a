//! Balance folds over ledger rows.
//!
//! Balances are never stored; they are derived from the append-only
//! ledgers. The one exception is the materialized stock counter, which
//! these folds exist to cross-check.

use rust_decimal::Decimal;

use super::types::{CashDirection, EntryType, StockMovementType};

/// Folds customer account rows into the running balance:
/// balance = Σ credit − Σ debit (the firm's open claim on the customer).
#[must_use]
pub fn account_balance<I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = (EntryType, Decimal)>,
{
    entries
        .into_iter()
        .fold(Decimal::ZERO, |acc, (entry, amount)| match entry {
            EntryType::Credit => acc + amount,
            EntryType::Debit => acc - amount,
        })
}

/// Produces the running balance after each account row, in input order.
/// Used for customer statements.
#[must_use]
pub fn running_balances<I>(entries: I) -> Vec<Decimal>
where
    I: IntoIterator<Item = (EntryType, Decimal)>,
{
    let mut balance = Decimal::ZERO;
    entries
        .into_iter()
        .map(|(entry, amount)| {
            balance = match entry {
                EntryType::Credit => balance + amount,
                EntryType::Debit => balance - amount,
            };
            balance
        })
        .collect()
}

/// Folds cash/bank rows into the register balance: Σ in − Σ out.
#[must_use]
pub fn register_balance<I>(rows: I) -> Decimal
where
    I: IntoIterator<Item = (CashDirection, Decimal)>,
{
    rows.into_iter()
        .fold(Decimal::ZERO, |acc, (direction, amount)| match direction {
            CashDirection::In => acc + amount,
            CashDirection::Out => acc - amount,
        })
}

/// Folds stock movements into the stock level: Σ in − Σ out. Transfers do
/// not change the level.
#[must_use]
pub fn stock_level<I>(movements: I) -> Decimal
where
    I: IntoIterator<Item = (StockMovementType, Decimal)>,
{
    movements
        .into_iter()
        .fold(Decimal::ZERO, |acc, (movement, quantity)| match movement {
            StockMovementType::In => acc + quantity,
            StockMovementType::Out => acc - quantity,
            StockMovementType::Transfer => acc,
        })
}
