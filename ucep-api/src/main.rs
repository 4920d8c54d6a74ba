//! ucep-api: campus engagement HTTP service
//!
//! Startup order: load TOML config, initialize tracing, resolve the root
//! folder, open/migrate the database, load the admin shared secret, spawn
//! the background scheduler, then serve until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ucep_api::api::health::MODULE_NAME;
use ucep_api::jobs::spawn_scheduler;
use ucep_api::{build_router, AppState};
use ucep_common::api::load_shared_secret;
use ucep_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use ucep_common::db::init_database;

/// Command-line arguments for ucep-api
#[derive(Parser, Debug)]
#[command(name = "ucep-api")]
#[command(about = "Campus engagement platform HTTP service")]
#[command(version)]
struct Args {
    /// Root folder holding ucep.db (overrides UCEP_ROOT and config.toml)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "UCEP_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "UCEP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut toml = TomlConfig::load_or_default();

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(toml.log_filter.as_deref().unwrap_or("info"))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", MODULE_NAME, env!("CARGO_PKG_VERSION"));

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .with_toml(toml.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load admin API shared secret")?;
    if shared_secret == 0 {
        info!("Admin API authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for admin API authentication");
    }

    let cancel_token = CancellationToken::new();
    let scheduler = spawn_scheduler(pool.clone(), cancel_token.clone());

    let app = build_router(AppState::new(pool.clone(), shared_secret));

    if args.bind_address.is_some() {
        toml.bind_address = args.bind_address;
    }
    if args.port.is_some() {
        toml.port = args.port;
    }
    let addr = toml.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("{} listening on http://{}", MODULE_NAME, addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cancel_token.cancel();
    if let Err(e) = scheduler.await {
        tracing::warn!("Scheduler task ended abnormally: {}", e);
    }
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
