//! Sequence Rule Engine CLI
//!
//! Local, file-driven front end for the Test Harness Interface (spec
//! §4.8): validate a rule document, or run it against a batch of event
//! records and print the matches. Does not implement the HTTP control
//! surface or rule store — those are external collaborators.

use clap::{Parser, Subcommand};
use sequence_rule_engine::config::EngineConfig;
use sequence_rule_engine::format;
use sequence_rule_engine::harness;
use sequence_rule_engine::rule::{self, RuleDoc};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a rule document without running it against any events.
    Validate {
        /// Path to a JSON rule document.
        rule: PathBuf,
    },
    /// Run a rule document against a batch of JSON event records.
    Test {
        /// Path to a JSON rule document.
        rule: PathBuf,
        /// Path to a JSON array of event records.
        events: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Validate { rule } => run_validate(&rule),
        Commands::Test { rule, events } => run_test(&rule, &events),
    }
}

fn load_rule_doc(path: &PathBuf) -> Result<RuleDoc, String> {
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {path:?}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("parsing {path:?}: {e}"))
}

fn run_validate(path: &PathBuf) -> ExitCode {
    let doc = match load_rule_doc(path) {
        Ok(doc) => doc,
        Err(message) => {
            error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match rule::compile(&doc, &EngineConfig::default()) {
        Ok(compiled) => {
            info!("{compiled}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("rule rejected: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_test(rule_path: &PathBuf, events_path: &PathBuf) -> ExitCode {
    let doc = match load_rule_doc(rule_path) {
        Ok(doc) => doc,
        Err(message) => {
            error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let events_text = match std::fs::read_to_string(events_path) {
        Ok(t) => t,
        Err(e) => {
            error!("reading {events_path:?}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let events: Vec<serde_json::Value> = match serde_json::from_str(&events_text) {
        Ok(v) => v,
        Err(e) => {
            error!("parsing {events_path:?}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match harness::run_batch(&doc, &events) {
        Ok(result) => {
            info!(
                rule_id = %result.rule.rule_id,
                events_processed = result.events_processed,
                matches = result.matches.len(),
                "batch complete"
            );
            for m in &result.matches {
                println!("{}", format::render(&result.rule.output_template, m));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("batch failed: {e}");
            ExitCode::FAILURE
        }
    }
}
