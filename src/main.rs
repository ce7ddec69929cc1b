//! Binary entry point: parse the command line, set up logging, open the
//! database, and hand the command to the store.
use std::io;
use std::process::ExitCode;

use clap::Parser;
use school_records_manager::cli::{execute, Cli};
use school_records_manager::{Config, SchoolRecordStore, StoreError};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<StoreError>() {
                Some(store_err) => eprintln!("ERROR ({}): {err:#}", store_err.kind()),
                None => eprintln!("ERROR: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::new(cli.db.clone(), cli.logging())?;
    config.logging.init();

    let mut store = SchoolRecordStore::open(&config.db_path)?;
    execute(&mut store, cli.command, &mut io::stdout().lock())
}
