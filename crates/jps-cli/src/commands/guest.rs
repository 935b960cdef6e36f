//! Guest cache commands

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use jps_core::{GuestCacheConfig, GuestReportsApi};
use jps_store::SqliteKvStore;
use serde_json::Value;

#[derive(Debug, Args)]
pub struct GuestArgs {
    #[command(subcommand)]
    pub command: GuestCommand,

    #[arg(long, global = true, default_value = ".jps/guest.db")]
    pub db: PathBuf,

    /// TOML cache configuration; defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum GuestCommand {
    /// Cache a report document (JSON file)
    Save { report: PathBuf },
    /// Print the current report
    Load,
    /// List cached reports, most recent first
    History {
        #[arg(long)]
        json: bool,
    },
    /// Print a cached report by id
    Open { id: String },
    /// Drop one report from the history
    Remove { id: String },
    /// Clear the current report (and history with --all)
    Clear {
        #[arg(long)]
        all: bool,
    },
}

pub fn execute(args: GuestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => GuestCacheConfig::from_toml_file(path)?,
        None => GuestCacheConfig::default(),
    };
    let store = Arc::new(SqliteKvStore::open(&args.db)?);
    let api = GuestReportsApi::new(store, Arc::new(jps_core::SystemClock), config);

    match args.command {
        GuestCommand::Save { report } => {
            let text = std::fs::read_to_string(&report)
                .map_err(|e| format!("cannot read {}: {}", report.display(), e))?;
            let document: Value = serde_json::from_str(&text)
                .map_err(|e| format!("{} is not valid JSON: {}", report.display(), e))?;
            let saved = api.try_save(&document)?;
            println!("Saved guest report {}", saved.id);
        }
        GuestCommand::Load => match api.try_load()? {
            Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
            None => println!("No current guest report"),
        },
        GuestCommand::History { json } => {
            let history = api.try_get_history()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No cached reports");
            } else {
                for entry in history {
                    println!(
                        "{}\t{}\t{}",
                        entry.id,
                        entry.job_title.as_deref().unwrap_or("Untitled Job"),
                        api.time_ago(entry.timestamp)
                    );
                }
            }
        }
        GuestCommand::Open { id } => {
            let document = api.try_require_report(&id)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        GuestCommand::Remove { id } => {
            if api.try_remove_from_history(&id)? {
                println!("Removed {}", id);
            } else {
                return Err(format!("no cached report with id {}", id).into());
            }
        }
        GuestCommand::Clear { all } => {
            if all {
                api.try_clear_all()?;
                println!("Cleared guest cache");
            } else {
                api.try_clear()?;
                println!("Cleared current guest report");
            }
        }
    }

    Ok(())
}
