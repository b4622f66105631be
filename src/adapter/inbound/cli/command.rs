//! Command-line interface definitions.
//!
//! Defines the CLI structure for snapsettle using `clap`: running the
//! poller, one-shot cycles, configuration checks, and memo tooling.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::Side;

/// Ledger snapshot intake and strategy order reconciliation
#[derive(Parser, Debug)]
#[command(name = "snapsettle")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the ledger until interrupted
    Run(RunArgs),

    /// Run a single poll cycle and print its report
    Poll(ConfigPathArg),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Decode or build transfer memos
    #[command(subcommand)]
    Memo(MemoCommand),
}

/// Subcommands for `snapsettle check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file syntax and semantics.
    Config(ConfigPathArg),
}

/// Subcommands for `snapsettle memo`.
#[derive(Subcommand, Debug)]
pub enum MemoCommand {
    /// Decode a hex memo and print the instruction.
    Decode {
        /// Memo as attached to the transfer (hex text).
        memo: String,
    },
    /// Encode an instruction into memo form.
    #[command(subcommand)]
    Encode(EncodeCommand),
}

/// Instruction kinds accepted by `snapsettle memo encode`.
#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// Two-leg arbitrage between two exchanges.
    Arbitrage {
        #[command(flatten)]
        common: MemoArgs,
        /// First exchange.
        #[arg(long)]
        exchange_a: String,
        /// Second exchange.
        #[arg(long)]
        exchange_b: String,
    },
    /// Two-leg market making on one exchange.
    MarketMaking {
        #[command(flatten)]
        common: MemoArgs,
        #[arg(long)]
        exchange: String,
    },
    /// Single-leg spot order.
    Spot {
        #[command(flatten)]
        common: MemoArgs,
        #[arg(long)]
        exchange: String,
        /// Order side [buy, sell].
        #[arg(long)]
        side: Side,
        /// Limit price; omit for a market order.
        #[arg(long)]
        price: Option<Decimal>,
    },
}

/// Fields shared by every instruction.
#[derive(Args, Debug)]
pub struct MemoArgs {
    /// Trace ID shared by both legs.
    #[arg(long)]
    pub trace: String,
    /// Pair symbol such as BTC/USDT.
    #[arg(long)]
    pub symbol: String,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Keep state in memory instead of the configured database.
    #[arg(long)]
    pub memory: bool,
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}
