//! Handler for `check config`.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::ledger::LEDGER_TOKEN_ENV;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate configuration file without starting the poller.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Database", &config.database);
    output::field("Ledger", &config.ledger.api_url);
    output::field("Fetch limit", config.ledger.fetch_limit);
    output::field("Interval", format!("{}ms", config.poller.interval_ms));
    output::field("Concurrency", config.poller.max_concurrent_transfers);
    output::field(
        "Extra legs",
        format!("{:?}", config.poller.extra_leg_policy).to_lowercase(),
    );
    for pair in &config.pairs {
        output::field(
            "Pair",
            format!(
                "{} {}",
                output::highlight(&pair.symbol),
                output::muted(format!("{} / {}", pair.base_asset_id, pair.target_asset_id))
            ),
        );
    }

    if config.pairs.is_empty() {
        output::warning("No pairs configured; every instruction will be refunded");
    }
    if token_present() {
        output::success("Ledger token detected");
    } else {
        output::warning(&format!("{LEDGER_TOKEN_ENV} is not set"));
    }

    output::success("Configuration check complete");
    Ok(())
}

fn token_present() -> bool {
    std::env::var(LEDGER_TOKEN_ENV).is_ok_and(|t| !t.is_empty())
}
