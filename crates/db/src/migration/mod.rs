//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration. Unique index names match
//! the constraint names the engine maps to domain conflicts.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger;
mod m20260301_000002_receivables;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger::Migration),
            Box::new(m20260301_000002_receivables::Migration),
        ]
    }
}
