//! Canonical test configuration.
//!
//! Single source of truth for the config used across tests.

use crate::infrastructure::config::settings::Config;

/// Config with the BTC/USDT and ETH/USDT pairs, a fast poll interval and a
/// ledger URL nothing listens on.
pub fn config_with_pairs() -> Config {
    let toml = r#"
        database = ":memory:"

        [ledger]
        api_url = "http://127.0.0.1:9"

        [ledger.http]
        retry_max_attempts = 1
        retry_backoff_ms = 0

        [poller]
        interval_ms = 10
        max_concurrent_transfers = 4

        [[pairs]]
        symbol = "BTC/USDT"
        base_asset_id = "btc"
        target_asset_id = "usdt"

        [[pairs]]
        symbol = "ETH/USDT"
        base_asset_id = "eth"
        target_asset_id = "usdt"
    "#;
    match Config::parse_toml(toml) {
        Ok(config) => config,
        Err(e) => panic!("test config must parse: {e}"),
    }
}
