//! Casino ledger HTTP server.
//!
//! Wires the ledger and wager resolver over in-memory or PostgreSQL stores
//! and serves them over a JSON API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use casino_ledger::{Database, Stores, wager::RandomOutcome};
use cl_server::{
    api,
    config::{ServerConfig, StorageConfig},
    logging, metrics,
};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run the casino ledger server

USAGE:
  cl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string, implies PostgreSQL storage  [default: env DATABASE_URL]

FLAGS:
  --memory                 Use in-memory storage regardless of the environment
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  LEDGER_STORAGE           memory | postgres  [default: memory]
  DATABASE_URL             PostgreSQL connection string
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  LEDGER_MAX_CAS_ATTEMPTS  Compare-and-set attempts before reporting contention  [default: 32]
  DEFAULT_STARTING_BALANCE Balance granted to new accounts  [default: 1000]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.memory)?;
    config.validate()?;

    info!(
        "Starting casino ledger server at {} with {} storage",
        config.bind,
        config.storage.name()
    );

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{}/metrics", metrics_bind);
    }

    let (stores, database) = match &config.storage {
        StorageConfig::Memory => {
            warn!("In-memory storage selected: balances are lost on restart");
            (Stores::in_memory(), None)
        }
        StorageConfig::Postgres(db_config) => {
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected successfully");

            db.migrate().await.context("Failed to run migrations")?;
            info!("Migrations applied");

            (db.stores(), Some(db))
        }
    };

    let state = api::AppState::new(
        stores,
        config.ledger.clone(),
        Arc::new(RandomOutcome::new()),
        database.clone(),
    );
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
