pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crmflow_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "crmflow",
    about = "Natural-language CRM automation",
    long_about = "Interpret a plain-English CRM request, apply it to HubSpot, and email the outcome.",
    after_help = "Examples:\n  crmflow run \"Create a contact for jane@acme.io\"\n  crmflow repl\n  crmflow doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a crmflow.toml file (must exist when given)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Process one request and print the pipeline result as JSON")]
    Run {
        #[arg(required = true, num_args = 1.., help = "Request text; words are joined by spaces")]
        request: Vec<String>,
    },
    #[command(about = "Read requests interactively until quit, exit or q")]
    Repl,
    #[command(about = "Run the four canonical scenarios against the configured backends")]
    Demo,
    #[command(about = "Print every effective setting with its source, secrets redacted")]
    Config,
    #[command(about = "Validate config and per-integration credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Run { request } => commands::run::run(&options, &request.join(" ")),
        Command::Repl => commands::repl::run(&options),
        Command::Demo => commands::demo::run(&options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            let (healthy, output) = commands::doctor::run(&options, json);
            commands::CommandResult { exit_code: if healthy { 0 } else { 2 }, output }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
