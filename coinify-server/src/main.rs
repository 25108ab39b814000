//! Coinify Payment Server
//!
//! Starts Coinify checkouts and refunds for stored orders and reconciles
//! order status from signed Coinify webhooks.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use coinify_core::orders::PgOrderStore;
use config::{ConfigLoader, Overrides, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Coinify payment intent and webhook reconciliation server
#[derive(Parser, Debug)]
#[command(name = "coinify-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./coinify-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Coinify API key, overrides `coinify.api_key`
    #[arg(long, env = "COINIFY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Coinify webhook shared secret, overrides `coinify.webhook_secret`
    #[arg(long, env = "COINIFY_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting coinify-server v{}", env!("CARGO_PKG_VERSION"));

    let overrides = Overrides {
        listen: args.listen,
        api_key: args.api_key,
        webhook_secret: args.webhook_secret,
    };
    let config_loader = Arc::new(ConfigLoader::new(&args.config, overrides));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!(
        api_base = %loaded_config.coinify.api_base(),
        "Configuration loaded from {:?}",
        args.config
    );

    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Orders and the delivery ledger live in the same database.
    let store = Arc::new(PgOrderStore::new(db_pool.clone()));
    let state = AppState::new(shared_config, store.clone(), store);

    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    shutdown_notify.notify_one();

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
