//! CLI module graph and dispatch.

pub mod check;
pub mod command;
pub mod memo;
pub mod output;
pub mod run;

use command::{CheckCommand, Cli, Commands, MemoCommand};

use crate::error::Result;

/// Route a parsed command line to its handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Poll(args) => run::execute_poll(&args.config).await,
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args.config),
        Commands::Memo(MemoCommand::Decode { memo: hex }) => memo::execute_decode(&hex),
        Commands::Memo(MemoCommand::Encode(command)) => memo::execute_encode(&command),
    }
}
