//! Command-line entry point.
//!
//! # Responsibility
//! - Read configuration from the environment and start logging.
//! - Open the database and run the startup seeder under `production`.
//! - Print the stored schools as JSON.

use log::info;
use schoolbook_core::db::{open_db, open_db_in_memory};
use schoolbook_core::{
    core_version, init_logging, run_startup_seed, AppConfig, SchoolRepository,
    SqliteSchoolRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("schoolbook: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir)?;
    }
    info!(
        "event=cli_start module=cli status=ok profile={} version={}",
        config.profile.as_str(),
        core_version()
    );

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let schools = SqliteSchoolRepository::try_new(&conn)?;
    run_startup_seed(config.profile, &schools)?;

    let stored = schools.find_all()?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}
