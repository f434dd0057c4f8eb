//! Command-line entry point over an eligibility database.

use clap::{Parser, Subcommand};
use eligibility_core::db::open_db;
use eligibility_core::{
    core_version, init_logging_from_config, CohortId, DeadlineCache, EligibilityConfig,
    PrincipalId, SqliteAffiliationStore, SqliteCatalogStore, SqliteLevelStore,
    SqliteTaskDueDateSource, VisibilityResolver,
};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "eligibility_cli",
    about = "Resolve catalog visibility and task deadlines from an eligibility database"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core crate version
    Version,

    /// List catalog items visible to one principal
    Visible {
        /// SQLite database file
        db_path: PathBuf,
        principal_id: PrincipalId,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Classify every task of one cohort
    Deadlines {
        /// SQLite database file
        db_path: PathBuf,
        cohort_id: CohortId,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Version => {
            println!("eligibility_core version={}", core_version());
            Ok(())
        }
        Command::Visible {
            db_path,
            principal_id,
            config,
        } => {
            load_config(config.as_deref())?;
            print_visible(&db_path, principal_id)
        }
        Command::Deadlines {
            db_path,
            cohort_id,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            print_deadlines(&db_path, cohort_id, &config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EligibilityConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => EligibilityConfig::load(path)?,
        None => EligibilityConfig::default(),
    };
    init_logging_from_config(&config)?;
    Ok(config)
}

fn print_visible(db_path: &Path, principal_id: PrincipalId) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db_path)?;
    let resolver = VisibilityResolver::new(
        SqliteCatalogStore::new(&conn),
        SqliteAffiliationStore::new(&conn),
        SqliteLevelStore::new(&conn),
    );

    let mut visible: Vec<_> = resolver.resolve_for(principal_id)?.into_iter().collect();
    visible.sort();
    for item_id in &visible {
        println!("{item_id}");
    }
    info!("event=cli_visible module=cli status=ok visible={}", visible.len());
    Ok(())
}

fn print_deadlines(
    db_path: &Path,
    cohort_id: CohortId,
    config: &EligibilityConfig,
) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db_path)?;
    let cache = DeadlineCache::with_clock(
        cohort_id,
        SqliteTaskDueDateSource::new(&conn),
        config.clock()?,
    )
    .with_expiring_window_days(config.expiring_window_days);

    let report = cache.report()?;
    for entry in &report {
        println!(
            "{} {} {}",
            entry.task_id,
            entry.due_at.to_rfc3339(),
            entry.status.as_str()
        );
    }
    info!("event=cli_deadlines module=cli status=ok tasks={}", report.len());
    Ok(())
}
