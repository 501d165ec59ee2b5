//! CrowdSale event indexer.
//!
//! Polls Soroban `getEvents` for the sale contract, stores decoded events in
//! SQLite and serves them over a small Axum REST API. SIGINT/SIGTERM stops
//! both halves cleanly.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod indexer;
mod rpc;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use indexer::IndexerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Optional; a missing .env is fine.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on_signal(shutdown.clone()));

    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        client,
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    let app = api::router(Arc::new(api::ApiState { pool: pool.clone() }));
    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{addr}");

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await;

    // Stop the poll loop too if the server exited on its own.
    shutdown.cancel();
    indexer_task.await?;
    pool.close().await;
    info!("shutdown complete");

    served?;
    Ok(())
}
