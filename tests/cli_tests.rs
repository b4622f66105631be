use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use snapsettle::testkit::fixtures::arbitrage_memo;

fn snapsettle() -> Command {
    Command::cargo_bin("snapsettle").expect("binary built")
}

#[test]
fn memo_decode_prints_the_instruction() {
    snapsettle()
        .args(["memo", "decode", &arbitrage_memo("trace-7", "BTC/USDT")])
        .assert()
        .success()
        .stdout(predicate::str::contains("trace-7"))
        .stdout(predicate::str::contains("binance"))
        .stdout(predicate::str::contains("4swap"));
}

#[test]
fn memo_decode_json_emits_the_instruction_object() {
    snapsettle()
        .args(["--json", "memo", "decode", &arbitrage_memo("trace-7", "BTC/USDT")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"instruction""#))
        .stdout(predicate::str::contains(r#""kind":"arbitrage""#));
}

#[test]
fn memo_decode_rejects_garbage() {
    snapsettle()
        .args(["memo", "decode", "not-hex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memo"));
}

#[test]
fn memo_encode_matches_the_codec() {
    snapsettle()
        .args([
            "memo",
            "encode",
            "arbitrage",
            "--trace",
            "trace-7",
            "--symbol",
            "BTC/USDT",
            "--exchange-a",
            "binance",
            "--exchange-b",
            "4swap",
        ])
        .assert()
        .success()
        .stdout(format!("{}\n", arbitrage_memo("trace-7", "BTC/USDT")));
}

#[test]
fn check_config_accepts_the_example() {
    snapsettle()
        .args(["check", "config", "--config"])
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration check complete"));
}

#[test]
fn check_config_fails_on_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[ledger]\napi_url = \"https://ledger.example\"\n[poller]\ninterval_ms = 0\n",
    )
    .unwrap();

    snapsettle()
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("poller.interval_ms"));
}
