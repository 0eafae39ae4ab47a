//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. The schema is declared
//! through the portable schema builder so the same migration runs on the
//! production Postgres and the SQLite test backend.

pub use sea_orm_migration::prelude::*;

mod m20260801_000001_initial;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260801_000001_initial::Migration)]
    }
}
