//! isosim CLI
//!
//! Run canonical or authored scenarios, sweep the catalog against its
//! documented outcomes, and export scenarios in the machine format.
//!
//! Exit codes: 0 clean, 1 isolation violation or regression mismatch,
//! 2 anything else (bad input, unreadable file).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use isosim_engine::config::{self, ScenarioFileError};
use isosim_engine::{
    catalog, find_scenario, CatalogEntry, IsosimError, ModelError, Scenario, Trace,
    TraceSimulator,
};

#[derive(Parser)]
#[command(name = "isosim", version, about = "Isolation-domain propagation simulator")]
struct Cli {
    /// Verbose logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the canonical scenarios
    List,
    /// Run a scenario and print its trace
    Run {
        /// Canonical scenario name
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        scenario: Option<String>,
        /// Load the scenario from an authoring-format YAML file instead
        #[arg(long)]
        file: Option<PathBuf>,
        /// Start the entry script in this domain instead of the scenario's
        #[arg(long)]
        from: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Replay every canonical scenario against its documented outcome
    Regression {
        /// Stop at the first mismatch
        #[arg(long)]
        fail_fast: bool,
    },
    /// Export a canonical scenario in the machine format
    Export {
        scenario: String,
        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Yaml,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn dispatch(command: Commands) -> Result<ExitCode, IsosimError> {
    match command {
        Commands::List => cmd_list(),
        Commands::Run {
            scenario,
            file,
            from,
            format,
        } => cmd_run(scenario, file, from, format),
        Commands::Regression { fail_fast } => cmd_regression(fail_fast),
        Commands::Export {
            scenario,
            output,
            format,
        } => cmd_export(scenario, output, format),
    }
}

fn cmd_list() -> Result<ExitCode, IsosimError> {
    for entry in catalog() {
        let outcome = if entry.expected.completes() {
            "completes"
        } else {
            "halts"
        };
        println!(
            "{:<26} {:<10} {}",
            entry.scenario.name, outcome, entry.scenario.title
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(
    name: Option<String>,
    file: Option<PathBuf>,
    from: Option<String>,
    format: Format,
) -> Result<ExitCode, IsosimError> {
    let scenario: Scenario = match (name, file) {
        (_, Some(path)) => config::load_scenario(&path)?,
        (Some(name), None) => find_scenario(&name)
            .map(|e| e.scenario.clone())
            .ok_or(IsosimError::UnknownScenario(name))?,
        (None, None) => unreachable!("clap requires a scenario name or --file"),
    };
    let entry = match &from {
        None => scenario.entry_domain.clone(),
        Some(spelling) => scenario.model.domains().resolve(spelling).ok_or_else(|| {
            IsosimError::Model(ModelError::UnknownDomain {
                name: spelling.clone(),
                registered: scenario
                    .model
                    .domains()
                    .names()
                    .map(str::to_string)
                    .collect(),
            })
        })?,
    };

    match TraceSimulator::new().run_from(&scenario, &entry) {
        Ok(trace) => {
            print_trace(&scenario, &trace, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(halted) => {
            match format {
                Format::Text => {
                    for step in &halted.steps {
                        println!("  {step}");
                    }
                    eprintln!("{halted}");
                }
                Format::Json => {
                    let value = serde_json::json!({
                        "scenario": halted.scenario,
                        "steps": halted.steps,
                        "error": halted.violation.to_string(),
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&value).map_err(ScenarioFileError::from)?
                    );
                }
            }
            Ok(ExitCode::from(1))
        }
    }
}

fn print_trace(scenario: &Scenario, trace: &Trace, format: Format) -> Result<(), IsosimError> {
    match format {
        Format::Text => {
            println!("scenario '{}': {}", scenario.name, scenario.title);
            println!("{trace}");
        }
        Format::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(trace).map_err(ScenarioFileError::from)?
            );
        }
    }
    Ok(())
}

fn cmd_regression(fail_fast: bool) -> Result<ExitCode, IsosimError> {
    let simulator = TraceSimulator::new();
    let check = |entry: &CatalogEntry| -> Option<String> {
        let outcome = simulator.run(&entry.scenario);
        entry
            .expected
            .verify(&outcome)
            .err()
            .map(|m| format!("{}: {m}", entry.scenario.name))
    };
    let failures: Vec<String> = if fail_fast {
        catalog().par_iter().find_map_any(check).into_iter().collect()
    } else {
        catalog().par_iter().filter_map(check).collect()
    };
    if failures.is_empty() {
        println!("{} scenarios verified", catalog().len());
        Ok(ExitCode::SUCCESS)
    } else {
        for failure in &failures {
            eprintln!("mismatch in {failure}");
        }
        Ok(ExitCode::from(1))
    }
}

fn cmd_export(
    name: String,
    output: Option<PathBuf>,
    format: ExportFormat,
) -> Result<ExitCode, IsosimError> {
    let entry =
        find_scenario(&name).ok_or_else(|| IsosimError::UnknownScenario(name.clone()))?;
    let text = match format {
        ExportFormat::Json => config::scenario_to_json(&entry.scenario)?,
        ExportFormat::Yaml => config::scenario_to_yaml(&entry.scenario)?,
    };
    match output {
        Some(path) => {
            fs::write(&path, &text)?;
            println!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}
