//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the ledger API token comes from
//! the `SNAPSETTLE_LEDGER_TOKEN` environment variable only.
//!
//! # Example
//!
//! ```no_run
//! use snapsettle::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::logging::LoggingConfig;
use super::pairs::{build_registry, PairConfig};
use super::poller::PollerConfig;
use crate::adapter::outbound::ledger::LedgerConfig;
use crate::adapter::outbound::pair::StaticPairRegistry;
use crate::application::ExecutionDefaults;
use crate::error::{ConfigError, Result};

/// Largest page the ledger API serves.
const MAX_FETCH_LIMIT: usize = 500;

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to SQLite database file.
    ///
    /// Defaults to "snapsettle.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ledger API connection.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Poll cadence, concurrency and refund retry policy.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Default parameters for new strategy orders.
    #[serde(default)]
    pub execution: ExecutionDefaults,

    /// Trading pairs accepted in memos.
    #[serde(default)]
    pub pairs: Vec<PairConfig>,
}

fn default_database_path() -> String {
    "snapsettle.db".to_string()
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize tracing from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Build the pair registry from the `[[pairs]]` table.
    ///
    /// # Errors
    /// Returns an error for an invalid pair table.
    pub fn pair_registry(&self) -> Result<StaticPairRegistry> {
        build_registry(&self.pairs)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }

        if self.ledger.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "ledger.api_url",
            }
            .into());
        }
        url::Url::parse(&self.ledger.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "ledger.api_url",
            reason: e.to_string(),
        })?;
        if self.ledger.fetch_limit == 0 || self.ledger.fetch_limit > MAX_FETCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "ledger.fetch_limit",
                reason: format!("must be between 1 and {MAX_FETCH_LIMIT}"),
            }
            .into());
        }
        if self.ledger.http.timeout_ms == 0 || self.ledger.http.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ledger.http",
                reason: "timeouts must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.http.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ledger.http.retry_max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.poller.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poller.interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.poller.max_concurrent_transfers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poller.max_concurrent_transfers",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.poller.refund_retry_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poller.refund_retry_limit",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.poller.refund_retry_batch == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poller.refund_retry_batch",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let arbitrage = &self.execution.arbitrage;
        if arbitrage.min_spread_pct < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "execution.arbitrage.min_spread_pct",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        let market_making = &self.execution.market_making;
        if market_making.bid_spread_pct < Decimal::ZERO
            || market_making.ask_spread_pct < Decimal::ZERO
        {
            return Err(ConfigError::InvalidValue {
                field: "execution.market_making",
                reason: "spreads must be 0 or greater".to_string(),
            }
            .into());
        }
        if market_making.order_layers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.market_making.order_layers",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if arbitrage.refresh_interval_secs == 0 || market_making.refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.refresh_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        build_registry(&self.pairs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ExtraLegPolicy;
    use crate::domain::PriceSource;
    use crate::error::Error;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [ledger]
        api_url = "https://ledger.example/v1"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse_toml(MINIMAL).unwrap();

        assert_eq!(config.database, "snapsettle.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ledger.fetch_limit, 100);
        assert_eq!(config.poller.interval_ms, 5000);
        assert!(config.poller.max_concurrent_transfers >= 1);
        assert_eq!(config.poller.extra_leg_policy, ExtraLegPolicy::Refund);
        assert_eq!(config.execution.arbitrage.min_spread_pct, dec!(0.5));
        assert_eq!(
            config.execution.market_making.price_source,
            PriceSource::MidPrice
        );
        assert!(config.pairs.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let toml = r#"
            database = "/var/lib/snapsettle/state.db"

            [logging]
            level = "debug"
            format = "json"

            [ledger]
            api_url = "https://ledger.example/v1"
            fetch_limit = 250

            [ledger.http]
            timeout_ms = 3000
            retry_max_attempts = 2

            [poller]
            interval_ms = 1000
            max_concurrent_transfers = 4
            refund_retry_limit = 3
            extra_leg_policy = "ignore"

            [execution.arbitrage]
            min_spread_pct = "0.8"
            price_source = "last_trade"

            [execution.market_making]
            order_layers = 5

            [[pairs]]
            symbol = "BTC/USDT"
            base_asset_id = "btc"
            target_asset_id = "usdt"
        "#;

        let config = Config::parse_toml(toml).unwrap();

        assert_eq!(config.logging.format, "json");
        assert_eq!(config.ledger.fetch_limit, 250);
        assert_eq!(config.ledger.http.timeout_ms, 3000);
        assert_eq!(config.ledger.http.connect_timeout_ms, 2000);
        assert_eq!(config.poller.settings().max_concurrent_transfers, 4);
        assert_eq!(config.poller.extra_leg_policy, ExtraLegPolicy::Ignore);
        assert_eq!(config.execution.arbitrage.min_spread_pct, dec!(0.8));
        assert_eq!(
            config.execution.arbitrage.price_source,
            PriceSource::LastTrade
        );
        assert_eq!(config.execution.market_making.order_layers, 5);
        assert_eq!(config.pair_registry().unwrap().len(), 1);
    }

    #[test]
    fn missing_api_url_is_reported() {
        let err = Config::parse_toml("").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "ledger.api_url"
            })
        ));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("[ledger]\napi_url = \"not a url\"", "ledger.api_url"),
            (
                "[ledger]\napi_url = \"https://l.example\"\nfetch_limit = 501",
                "ledger.fetch_limit",
            ),
            (
                "[ledger]\napi_url = \"https://l.example\"\n[poller]\ninterval_ms = 0",
                "poller.interval_ms",
            ),
            (
                "[ledger]\napi_url = \"https://l.example\"\n[poller]\nmax_concurrent_transfers = 0",
                "poller.max_concurrent_transfers",
            ),
            (
                "[ledger]\napi_url = \"https://l.example\"\n[poller]\nrefund_retry_batch = 0",
                "poller.refund_retry_batch",
            ),
            (
                "[ledger]\napi_url = \"https://l.example\"\n[execution.market_making]\norder_layers = 0",
                "execution.market_making.order_layers",
            ),
        ];

        for (toml, expected) in cases {
            match Config::parse_toml(toml) {
                Err(Error::Config(ConfigError::InvalidValue { field, .. })) => {
                    assert_eq!(field, expected);
                }
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::parse_toml("[ledger"),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }
}
