//! Lab Inventory CLI - command-line front end for the inventory store.
//!
//! Every command opens the store in the data directory, runs once and
//! exits. Log output goes to stderr so command output can be piped.

mod commands;

use anyhow::Result;
use clap::Parser;
use labinv_core::config::AppConfig;
use labinv_core::{DataPaths, InventoryError, RecordStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "labinv")]
#[command(about = "Track network lab equipment across locations", version)]
struct Args {
    /// Directory holding the inventory JSON files
    #[arg(long, env = AppConfig::DATA_DIR_ENV, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<InventoryError>() {
                Some(inner) if inner.is_user_error() => eprintln!("Error: {}", inner),
                _ => eprintln!("Error: {:?}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let paths = DataPaths::resolve(args.data_dir)?;
    debug!("Data directory: {}", paths.root().display());

    let mut store = RecordStore::open(paths);
    commands::run(args.command, &mut store)
}
