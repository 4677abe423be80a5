//! Ledger API entry point.
//!
//! Holds a single in-memory campaign ledger behind a read/write lock and
//! exposes its transitions, review queues, notification logs and views over
//! an Axum REST API.

mod api;
mod config;
mod errors;
mod seed;

use campaign_ledger::CampaignLedger;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::AppState;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut ledger = CampaignLedger::new();
    if config.seed_demo {
        let seeded = seed::seed_demo(&mut ledger)?;
        info!("Demo data loaded: {seeded} campaigns");
    }

    let state = AppState::new(ledger, config.simulated_latency());
    let mut app = api::router(state).layer(TraceLayer::new_for_http());
    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
