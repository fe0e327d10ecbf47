//! CLI entrypoint for Staged Quorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use staged_domain::OutputFormat;
use staged_infrastructure::simulation::event_counts;
use staged_infrastructure::{
    ConfigLoader, FileConfig, JsonlEventLog, Scenario, SimulationReport, SimulationRunner,
    StateFile, StepResult,
};
use staged_presentation::{
    Cli, Command, ConsoleFormatter, JsonFormatter, OutputConfig, OutputFormatter, StepView,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let output = OutputConfig {
        format: config.output.format.unwrap_or_default(),
        color: config.output.color,
    }
    .with_overrides(cli.format.map(Into::into), cli.no_color);
    output.apply_color();

    info!("Starting Staged Quorum");

    match cli.command.clone().unwrap_or(Command::Validate) {
        Command::Validate => validate(&config, output),
        Command::Simulate {
            scenario,
            state,
            event_log,
        } => simulate(&config, output, &scenario, state, event_log).await,
    }
}

fn formatter(output: OutputConfig) -> Box<dyn OutputFormatter> {
    match output.format {
        OutputFormat::Pretty => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn validate(config: &FileConfig, output: OutputConfig) -> Result<()> {
    let issues = config.validate();
    let formatter = formatter(output);

    match output.format {
        OutputFormat::Pretty => {
            println!("{}", ConsoleFormatter::header("Stage Configuration"));
            println!(
                "Coordinator: {} (target {} via {})",
                config.coordinator.id,
                config.coordinator.target,
                config.coordinator.mode
            );
            println!();
            print!("{}", formatter.format_stages(&config.stages()));
            println!("{}", ConsoleFormatter::section_header("Validation"));
            println!("{}", formatter.format_issues(&issues));
            print!("{}", ConsoleFormatter::footer());
        }
        OutputFormat::Json => {
            println!("{}", formatter.format_stages(&config.stages()));
            println!("{}", formatter.format_issues(&issues));
        }
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        bail!("Configuration has {} error(s)", errors);
    }
    Ok(())
}

async fn simulate(
    config: &FileConfig,
    output: OutputConfig,
    scenario_path: &Path,
    state: Option<PathBuf>,
    event_log: Option<PathBuf>,
) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;

    let state_file = state.map(StateFile::new);
    let snapshot = match &state_file {
        Some(file) => file.load()?,
        None => None,
    };

    let event_log = match event_log.or_else(|| config.output.event_log.clone()) {
        Some(path) => Some(Arc::new(JsonlEventLog::new(&path).ok_or_else(|| {
            anyhow!("Cannot open event log {}", path.display())
        })?)),
        None => None,
    };

    let report = SimulationRunner::build(config, &scenario, snapshot, event_log)
        .await?
        .run(&scenario.steps)
        .await?;

    if let Some(file) = &state_file {
        file.save(&report.state)?;
        info!("Saved state to {}", file.path().display());
    }

    match output.format {
        OutputFormat::Pretty => print_report(scenario_path, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    let unmet = report.unmet_expectations();
    if !unmet.is_empty() {
        bail!(
            "{} step(s) did not meet their expectation: {}",
            unmet.len(),
            unmet
                .iter()
                .map(|s| format!("#{}", s.step))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

fn print_report(scenario_path: &Path, report: &SimulationReport) {
    println!(
        "{}",
        ConsoleFormatter::header(&format!("Simulation: {}", scenario_path.display()))
    );

    println!("{}", ConsoleFormatter::section_header("Steps"));
    for outcome in &report.steps {
        let result = match &outcome.result {
            StepResult::Ok { detail } => Ok(detail.as_str()),
            StepResult::Failed { error } => Err(error.as_str()),
        };
        println!(
            "{}",
            ConsoleFormatter::step(&StepView {
                step: outcome.step,
                at: outcome.at,
                description: &outcome.description,
                result,
                expected: outcome.meets_expectation(),
                events: &outcome.events,
            })
        );
    }

    println!("{}", ConsoleFormatter::section_header("Proposals"));
    if report.proposals.is_empty() {
        println!("  none");
    }
    for proposal in &report.proposals {
        println!(
            "{}",
            ConsoleFormatter::proposal(&proposal.label, &proposal.id.short(), proposal.status)
        );
    }

    if !report.executions.is_empty() {
        println!("{}", ConsoleFormatter::section_header("Executions"));
        for record in &report.executions {
            println!(
                "  {} on {} ({}): {} actions, failure map {:#b}",
                record.proposal_id.short(),
                record.target,
                record.mode,
                record.actions,
                record.failure_map
            );
        }
    }

    let counts = event_counts(report);
    if !counts.is_empty() {
        println!("{}", ConsoleFormatter::section_header("Events"));
        for (kind, count) in counts {
            println!("  {:<26} {}", kind, count);
        }
    }
    print!("{}", ConsoleFormatter::footer());
}
