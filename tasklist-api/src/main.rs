//! # Tasklist API Server
//!
//! Serves the task list HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) DATABASE_BACKEND=memory cargo run -p tasklist-api
//! ```
//!
//! See `config` for the full list of environment variables.

use tasklist_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use tasklist_shared::db::store::Stores;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tasklist_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading LOG_FORMAT / RUST_LOG
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env()?);

    tracing::info!(
        "Tasklist API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let stores = Stores::connect(&config.database).await?;

    let address = config.bind_address();
    let state = AppState::new(stores.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stores.close().await;
    tracing::info!("Server stopped");

    Ok(())
}
