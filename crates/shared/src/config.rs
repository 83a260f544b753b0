//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite://...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a write unit of work is attempted when a concurrent
    /// append to the same ledger key is detected.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
    /// Balances within this many rials of zero are neither debtors nor creditors.
    #[serde(default = "default_debtor_threshold")]
    pub debtor_threshold_rials: Decimal,
    /// Carat buckets at or below this weight are left out of stock summaries.
    #[serde(default = "default_stock_tolerance")]
    pub stock_tolerance_grams: Decimal,
}

fn default_max_write_attempts() -> u32 {
    3
}

fn default_debtor_threshold() -> Decimal {
    Decimal::new(1, 2)
}

fn default_stock_tolerance() -> Decimal {
    Decimal::new(1, 3)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
            debtor_threshold_rials: default_debtor_threshold(),
            stock_tolerance_grams: default_stock_tolerance(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.max_write_attempts, 3);
        assert_eq!(ledger.debtor_threshold_rials, dec!(0.01));
        assert_eq!(ledger.stock_tolerance_grams, dec!(0.001));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config = config::Config::builder()
            .set_override("database.url", "sqlite::memory:")
            .unwrap()
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.database.url, "sqlite::memory:");
        assert_eq!(app.database.max_connections, 10);
        assert_eq!(app.ledger.max_write_attempts, 3);
        assert!(!app.logging.json);
    }

    #[test]
    fn test_deserialize_overrides() {
        let config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/tala")
            .unwrap()
            .set_override("ledger.max_write_attempts", 5)
            .unwrap()
            .set_override("logging.json", true)
            .unwrap()
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();

        assert_eq!(app.ledger.max_write_attempts, 5);
        assert!(app.logging.json);
    }
}
