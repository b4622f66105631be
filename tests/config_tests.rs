use std::io::Write;

use snapsettle::application::ExtraLegPolicy;
use snapsettle::error::{ConfigError, Error};
use snapsettle::infrastructure::config::settings::Config;
use snapsettle::port::PairRegistry;

fn load(contents: &str) -> snapsettle::error::Result<Config> {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    Config::load(file.path())
}

#[test]
fn example_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml");
    let config = Config::load(path).expect("config.example.toml must load");

    assert!(!config.pairs.is_empty());
    assert_eq!(config.poller.extra_leg_policy, ExtraLegPolicy::Refund);
}

#[test]
fn pair_table_feeds_the_registry() {
    let config = load(
        r#"
        [ledger]
        api_url = "https://ledger.example"

        [[pairs]]
        symbol = "ETH/USDT"
        base_asset_id = "eth"
        target_asset_id = "usdt"
        "#,
    )
    .unwrap();

    let registry = config.pair_registry().unwrap();
    let pair = registry
        .resolve(&"ETH/USDT".parse().unwrap())
        .expect("pair registered");
    assert_eq!(pair.base_asset_id.as_str(), "eth");
    assert_eq!(pair.target_asset_id.as_str(), "usdt");
}

#[test]
fn duplicate_pairs_are_rejected() {
    let err = load(
        r#"
        [ledger]
        api_url = "https://ledger.example"

        [[pairs]]
        symbol = "BTC/USDT"
        base_asset_id = "btc"
        target_asset_id = "usdt"

        [[pairs]]
        symbol = "BTC/USDT"
        base_asset_id = "btc2"
        target_asset_id = "usdt"
        "#,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue {
            field: "pairs.symbol",
            ..
        })
    ));
}

#[test]
fn unknown_extra_leg_policy_is_a_parse_error() {
    let err = load(
        r#"
        [ledger]
        api_url = "https://ledger.example"

        [poller]
        extra_leg_policy = "keep"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[test]
fn missing_file_is_reported() {
    let err = Config::load("/nonexistent/snapsettle.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}
