//! Language portal server (lp-server) - Main entry point
//!
//! Serves the vocabulary, study session and dashboard API over a SQLite
//! store. The database is created and seeded on first start.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lp_common::config::{ConfigOverrides, PortalConfig};
use lp_common::db::open_database;
use lp_common::seed::{init_and_seed, InitOutcome};
use lp_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lp-server
#[derive(Parser, Debug)]
#[command(name = "lp-server")]
#[command(about = "Korean vocabulary portal HTTP API")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Folder holding the database file
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Folder holding data_korean.json and word_groups.json
    #[arg(short, long)]
    seed_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lp_server=info,lp_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = PortalConfig::resolve(&ConfigOverrides {
        root_folder: args.root_folder,
        seed_dir: args.seed_dir,
        host: args.host,
        port: args.port,
    });

    info!("Starting lp-server on {}", config.bind_address());
    info!("Root folder: {}", config.root_folder.display());

    config
        .ensure_root_folder()
        .context("Failed to prepare root folder")?;
    let db = open_database(&config.database_path())
        .await
        .context("Failed to open database")?;

    match init_and_seed(&db, &config.seed_dir)
        .await
        .context("Failed to seed database")?
    {
        InitOutcome::Seeded(report) => info!(
            "Seeded {} words, {} groups, {} activities",
            report.words_created, report.groups_created, report.activities_created
        ),
        InitOutcome::AlreadyPopulated => info!("Database already populated"),
    }

    let app = build_router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .context("Failed to bind to address")?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
