use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use service_desk::app::{app, AppState};
use service_desk::auth::TokenIssuer;
use service_desk::config;
use service_desk::database::{DatabaseManager, Store};
use service_desk::services::ServiceOptions;

#[derive(Parser)]
#[command(name = "service-desk-api")]
#[command(about = "Request-ticketing HTTP API")]
#[command(version)]
struct Cli {
    /// Port to listen on (overrides API_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Skip applying schemas/v1/schema.sql at startup
    #[arg(long)]
    no_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting service desk API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if config.database.apply_schema && !cli.no_schema {
        database.apply_schema().await.context("failed to apply schema")?;
    }

    let tokens = TokenIssuer::from_config(&config.security).context("invalid JWT configuration")?;
    let store = Store::postgres(database.pool());
    let state = AppState::new(&store, tokens, ServiceOptions::from_config(config));

    let port = cli.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}
