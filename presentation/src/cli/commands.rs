//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for events and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable lines
    Pretty,
    /// One JSON document
    Json,
}

impl From<OutputFormat> for staged_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Pretty => staged_domain::OutputFormat::Pretty,
            OutputFormat::Json => staged_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for staged-quorum
#[derive(Parser, Debug)]
#[command(name = "staged-quorum")]
#[command(author, version, about = "Multi-stage proposal coordinator")]
#[command(long_about = r#"
Staged Quorum moves proposals through an ordered sequence of stages.

Each stage hands the proposal to a set of bodies, waits for their approvals
and vetoes within its timing windows, and either advances the proposal to
the next stage or, after the last one, executes its payload.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./staged.toml       Project-level config
3. ~/.config/staged-quorum/config.toml   Global config

Example:
  staged-quorum validate
  staged-quorum simulate scenarios/grant.toml
  staged-quorum --config dao.toml simulate grant.toml --state state.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check the configuration and print its stages
    Validate,

    /// Run a scenario file against the configured stages
    Simulate {
        /// Scenario file (TOML)
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Resume from and save coordinator state to this file
        #[arg(long, value_name = "PATH")]
        state: Option<PathBuf>,

        /// Append committed events to this JSONL file (overrides [output] event_log)
        #[arg(long, value_name = "PATH")]
        event_log: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::parse_from([
            "staged-quorum",
            "-vv",
            "simulate",
            "grant.toml",
            "--state",
            "state.json",
            "--format",
            "json",
        ]);

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(
            cli.command,
            Some(Command::Simulate {
                scenario: PathBuf::from("grant.toml"),
                state: Some(PathBuf::from("state.json")),
                event_log: None,
            })
        );
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::parse_from(["staged-quorum", "--show-config"]);
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
