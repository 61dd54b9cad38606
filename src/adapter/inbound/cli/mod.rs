//! Command-line entry points.

pub mod check;
pub mod command;
pub mod output;
pub mod run;

use command::{CheckCommand, Cli, Commands};
use output::OutputConfig;

use crate::error::Result;

/// Apply global flags and dispatch to the selected command.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose), cli.color);
    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(args)) => check::config::execute_config(&args.resolve()),
        Commands::Check(CheckCommand::Health(args)) => check::health::execute_health(&args).await,
    }
}
