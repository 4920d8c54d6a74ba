//! ucep-admin: offline maintenance commands
//!
//! Operates directly on the database in the resolved root folder. Safe to
//! run while the service is up; SQLite WAL mode serializes the writers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ucep_api::jobs::{run_retention_sweep, run_rollup};
use ucep_api::seed::{apply_seed, SeedFile};
use ucep_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use ucep_common::db::{get_schema_version, init_database};

#[derive(Parser, Debug)]
#[command(name = "ucep-admin")]
#[command(about = "Maintenance commands for the campus engagement platform")]
#[command(version)]
struct Cli {
    /// Root folder holding ucep.db (overrides UCEP_ROOT and config.toml)
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,
    /// Load users, student profiles and jobs from a TOML file
    Seed {
        /// Seed file path
        file: PathBuf,
    },
    /// Run the retention sweep once
    Sweep,
    /// Recompute the analytics rollup for one day
    Rollup {
        /// Day to roll up (YYYY-MM-DD, default today UTC)
        #[arg(long)]
        day: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml = TomlConfig::load_or_default();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(toml.log_filter.as_deref().unwrap_or("info"))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = RootFolderResolver::new("ucep-admin")
        .with_cli_arg(cli.root_folder)
        .with_toml(toml)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    let db_path = initializer.database_path();

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let outcome = match cli.command {
        Command::Migrate => migrate(&pool, &db_path).await,
        Command::Seed { file } => seed(&pool, &file).await,
        Command::Sweep => sweep(&pool).await,
        Command::Rollup { day } => {
            let day = day.unwrap_or_else(|| chrono::Utc::now().date_naive());
            rollup(&pool, day).await
        }
    };

    pool.close().await;
    outcome
}

async fn migrate(pool: &SqlitePool, db_path: &Path) -> Result<()> {
    // init_database already applied any pending migrations
    let version = get_schema_version(pool).await?;
    println!("{}: schema version {}", db_path.display(), version);
    Ok(())
}

async fn seed(pool: &SqlitePool, file: &Path) -> Result<()> {
    let seed = SeedFile::load(file)
        .with_context(|| format!("Failed to load seed file {}", file.display()))?;
    let report = apply_seed(pool, &seed)
        .await
        .with_context(|| format!("Failed to seed from {}", file.display()))?;

    println!(
        "Created {} users ({} reused), wrote {} profiles, created {} jobs ({} skipped)",
        report.users_created,
        report.users_reused,
        report.profiles_written,
        report.jobs_created,
        report.jobs_skipped
    );
    Ok(())
}

async fn sweep(pool: &SqlitePool) -> Result<()> {
    let report = run_retention_sweep(pool).await?;
    println!(
        "Deleted {} audit rows, anonymized {} users, deleted {} analytics rows",
        report.audit_rows_deleted, report.users_anonymized, report.analytics_rows_deleted
    );
    Ok(())
}

async fn rollup(pool: &SqlitePool, day: NaiveDate) -> Result<()> {
    let analytics = run_rollup(pool, day).await?;
    println!(
        "{}: {} new users, {} jobs posted, {} applications, {} event RSVPs",
        analytics.day,
        analytics.new_users,
        analytics.jobs_posted,
        analytics.applications,
        analytics.event_rsvps
    );
    Ok(())
}
