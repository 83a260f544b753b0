//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and built with the `SeaQuery`
//! schema builder so the same set runs on PostgreSQL and SQLite.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_initial;
mod m20261001_000002_ledger_indexes;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_initial::Migration),
            Box::new(m20261001_000002_ledger_indexes::Migration),
        ]
    }
}
