//! JobPostScore CLI
//!
//! Inspection front-end for the diff engine and the guest report cache

use clap::{Parser, Subcommand};
use jps_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "jps")]
#[command(about = "JobPostScore - job posting diff review and guest report cache", long_about = None)]
struct Cli {
    /// Log to stderr: pretty or json
    #[arg(long, global = true, value_parser = parse_profile)]
    log_format: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff an original and an optimized posting
    Diff(commands::diff::DiffArgs),
    /// Inspect or modify the guest report cache
    Guest(commands::guest::GuestArgs),
}

fn parse_profile(value: &str) -> Result<Profile, String> {
    Profile::from_flag(value).ok_or_else(|| format!("unknown log format `{}`", value))
}

fn main() {
    let cli = Cli::parse();

    if let Some(profile) = cli.log_format {
        logging_facility::init(profile);
    }

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Guest(args) => commands::guest::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
