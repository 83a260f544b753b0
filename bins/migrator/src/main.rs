//! Database migration runner for the Tala ledger.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop every table and migrate from scratch
//!
//! The target database comes from `DATABASE_URL` (or `-u <url>`), Postgres
//! or SQLite.

use sea_orm_migration::prelude::*;
use tala_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli installs its own subscriber
    cli::run_cli(Migrator).await;
}
