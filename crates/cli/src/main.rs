// closetrack CLI - headless month-end close tag extraction

mod exit_codes;
mod extract;
mod tags;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use extract::{cmd_extract, ExtractCommands};
use tags::{cmd_tag, TagCommands};

#[derive(Parser)]
#[command(name = "closetrack")]
#[command(about = "Reconciliation tag extraction for month-end close")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract tagged values from a supporting document
    #[command(subcommand)]
    Extract(ExtractCommands),

    /// Reconciliation tag utilities
    #[command(subcommand)]
    Tag(TagCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: closetrack <command> [options]");
            eprintln!("       closetrack --help for more information");
            Ok(())
        }
        Some(Commands::Extract(cmd)) => cmd_extract(cmd),
        Some(Commands::Tag(cmd)) => cmd_tag(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }
}
