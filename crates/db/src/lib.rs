//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the back-office tables
//! - Repository abstractions executing the core's posting plans and state
//!   transitions inside single database transactions
//! - The schema migration definition
//!
//! All cross-instance mutual exclusion lives in the database: unique
//! indexes back the document number allocator, conditional updates back
//! the version tokens and the stock counter floor. The repositories never
//! take in-process locks.

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod scope;

pub use repositories::{
    ChequeRepository, CustomerRepository, DeliveryNoteRepository, InvoiceRepository,
    OrderRepository, PaymentRepository, StockRepository,
};

use defter_shared::config::DatabaseConfig;
use defter_shared::AppError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}

/// Maps a database error onto the application error taxonomy.
pub(crate) fn db_err(err: DbErr) -> AppError {
    AppError::Database(err.to_string())
}
