//! cyload - inspect Cypher upload scripts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyload_settings::UploadSettings;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "cyload", version, about = "Inspect Cypher scripts before uploading them")]
struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH", env = "CYLOAD_SETTINGS")]
    settings: Option<PathBuf>,

    /// Debug-level logging for cyload crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to the log directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the statements of a script with their classification
    Statements {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show how a script would be grouped into transactions
    Plan {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Data statements per transaction (defaults to the configured value)
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective upload settings
    Settings,
}

fn load_settings(path: Option<&PathBuf>) -> Result<UploadSettings> {
    match path {
        Some(path) => UploadSettings::load_from(path)
            .with_context(|| format!("Failed to load settings from {:?}", path)),
        None => UploadSettings::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.verbose {
        logging::LoggingConfig::development()
    } else {
        logging::LoggingConfig::production()
    };
    logging::init(config.with_json_logs(cli.log_file))?;

    let settings = load_settings(cli.settings.as_ref())?;

    match cli.command {
        Command::Statements { file, json } => commands::statements(&file, json).await,
        Command::Plan {
            file,
            batch_size,
            json,
        } => {
            let batch_size = batch_size
                .unwrap_or(settings.default_batch_size)
                .max(1);
            commands::plan(&file, batch_size, json).await
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
