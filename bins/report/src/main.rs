//! Tala ledger reports.
//!
//! Usage:
//!   tala-report stock                          - Carat stock summary
//!   tala-report reconcile                      - Carat buckets vs completed items
//!   tala-report balances [threshold]           - Debtors and creditors
//!   tala-report weights <contact>              - Weight balance per category
//!   tala-report statement <contact> [from] [to] - Contact statement (dates as YYYY-MM-DD)
//!
//! Reports are written to stdout as pretty JSON; logs go to stderr.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tala_db::connect;
use tala_db::repositories::{
    CaratInventoryRepository, ContactWeightLedgerRepository, RialBalanceRepository,
    StatementRepository,
};
use tala_shared::AppConfig;
use tala_shared::config::LoggingConfig;
use tala_shared::types::ContactId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!("usage: tala-report <stock|reconcile|balances|weights|statement> [args]");
    };

    let db = connect(&config.database).await?;
    info!(command = %command, "connected to database");

    match command.as_str() {
        "stock" => {
            let carats = CaratInventoryRepository::new(db)
                .with_tolerance(config.ledger.stock_tolerance_grams);
            print_json(&carats.summarize().await)
        }
        "reconcile" => {
            let carats = CaratInventoryRepository::new(db)
                .with_tolerance(config.ledger.stock_tolerance_grams);
            print_json(&carats.reconcile().await?)
        }
        "balances" => {
            let threshold = args
                .get(1)
                .map(|raw| raw.parse::<Decimal>())
                .transpose()
                .context("threshold must be a decimal number")?;
            let rials = RialBalanceRepository::with_config(db, &config.ledger);
            print_json(&rials.get_debtors_and_creditors(threshold).await)
        }
        "weights" => {
            let contact_id = contact_arg(&args)?;
            let weights = ContactWeightLedgerRepository::with_config(db, &config.ledger);
            print_json(&weights.balances_for_contact(contact_id).await?)
        }
        "statement" => {
            let contact_id = contact_arg(&args)?;
            let start = date_arg(&args, 2)?;
            let end = date_arg(&args, 3)?;
            let statement = StatementRepository::new(db)
                .statement(contact_id, start, end)
                .await?;
            print_json(&statement)
        }
        other => bail!("unknown report: {other}"),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tala=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn contact_arg(args: &[String]) -> anyhow::Result<ContactId> {
    let raw = args.get(1).context("missing contact id")?;
    raw.parse::<ContactId>()
        .with_context(|| format!("invalid contact id: {raw}"))
}

fn date_arg(args: &[String], index: usize) -> anyhow::Result<Option<NaiveDate>> {
    args.get(index)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid date: {raw}"))
        })
        .transpose()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
