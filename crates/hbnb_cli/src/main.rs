//! `console` entry point.
//!
//! # Responsibility
//! - Resolve configuration, start file logging and load the record store.
//! - Run one session over stdin/stdout.
//!
//! # Invariants
//! - Startup failures go to stderr with a non-zero exit; stdout carries
//!   only command output.

use hbnb_core::{
    init_logging, run_session, Console, ConsoleConfig, EntityRegistry, FileStorage,
};
use log::{error, info};
use std::io::{self, BufWriter, IsTerminal};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

fn main() -> ExitCode {
    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("console: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The console still works without logs.
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("console: logging disabled: {err}");
    }

    let registry = EntityRegistry::builtin();
    let storage = match FileStorage::open(&config.store_path, registry) {
        Ok(storage) => storage,
        Err(err) => {
            error!("event=console_start module=cli status=error");
            eprintln!("console: cannot load store: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "event=console_start module=cli status=ok records={}",
        storage.len()
    );

    let console = Console::new(registry, Arc::new(Mutex::new(storage)));
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut input = stdin.lock();
    let mut output = BufWriter::new(io::stdout().lock());

    match run_session(&console, &mut input, &mut output, interactive) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=console_exit module=cli status=error");
            eprintln!("console: {err}");
            ExitCode::FAILURE
        }
    }
}
