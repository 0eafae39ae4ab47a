//! `SeaORM` entity definitions for the back-office tables.
//!
//! Status and direction columns are plain strings carrying the core
//! enums' snake_case wire names - one stable representation end to end.

pub mod account_transactions;
pub mod bank_accounts;
pub mod bank_transactions;
pub mod cash_registers;
pub mod cash_transactions;
pub mod cheques;
pub mod customers;
pub mod delivery_note_items;
pub mod delivery_notes;
pub mod firms;
pub mod invoice_items;
pub mod invoices;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stock_movements;
pub mod users;
