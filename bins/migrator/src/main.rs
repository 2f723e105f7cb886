//! Schema migration runner for the ledger and receivables tables.
//!
//! Usage:
//!   migrator up      - apply pending migrations
//!   migrator down    - roll back the last migration
//!   migrator status  - list applied and pending migrations
//!   migrator fresh   - drop everything and re-apply
//!
//! Reads `DATABASE_URL`, optionally from a `.env` file.

use sea_orm_migration::prelude::*;
use tally_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own subscriber
    cli::run_cli(Migrator).await;
}
