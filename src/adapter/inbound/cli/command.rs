//! Command-line interface definitions.
//!
//! `solbot run` starts the service; `solbot check` validates configuration
//! or probes a running instance.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Configuration file used when neither `--config` nor `SOLBOT_CONFIG` is set.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Status endpoint probed by `check health` by default.
pub const DEFAULT_STATUS_URL: &str = "http://127.0.0.1:8000/status";

/// Multi-symbol market analysis service
#[derive(Parser, Debug)]
#[command(name = "solbot")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and scheduler
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and environment overrides.
    Config(ConfigPathArg),
    /// Probe the status endpoint of a running instance.
    Health(HealthArgs),
}

#[derive(Parser, Debug, Default)]
pub struct ConfigPathArg {
    /// Path to the configuration file [default: $SOLBOT_CONFIG or config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ConfigPathArg {
    /// The explicit path, then `SOLBOT_CONFIG`, then [`DEFAULT_CONFIG`].
    #[must_use]
    pub fn resolve(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| std::env::var_os("SOLBOT_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
    }
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    /// Override the listen address (e.g. 0.0.0.0:8000)
    #[arg(long)]
    pub bind: Option<String>,

    /// Do not start the scheduler, even if autostart is configured
    #[arg(long)]
    pub no_scheduler: bool,
}

#[derive(Parser, Debug)]
pub struct HealthArgs {
    /// Status endpoint to probe
    #[arg(long, default_value = DEFAULT_STATUS_URL)]
    pub url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::parse_from([
            "solbot",
            "run",
            "--config",
            "custom.toml",
            "--bind",
            "127.0.0.1:9000",
            "--no-scheduler",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.resolve(), PathBuf::from("custom.toml"));
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1:9000"));
        assert!(args.no_scheduler);
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = Cli::parse_from(["solbot", "check", "health", "--json", "-q"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.color, ColorChoice::Auto));
        let Commands::Check(CheckCommand::Health(args)) = cli.command else {
            panic!("expected check health");
        };
        assert_eq!(args.url, DEFAULT_STATUS_URL);
        assert_eq!(args.timeout, 5);
    }

    #[test]
    fn color_choice_parses() {
        let cli = Cli::parse_from(["solbot", "--color", "never", "check", "config"]);
        assert!(matches!(cli.color, ColorChoice::Never));
    }
}
