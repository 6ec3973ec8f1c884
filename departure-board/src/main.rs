use std::error::Error;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use departure_board::board::DepartureBoard;
use departure_board::config::BoardConfig;
use departure_board::feed::ZipFeed;
use departure_board::store::StopTimeStore;
use departure_board::web::{AppState, create_router};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info,departure_board=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = BoardConfig::from_env()?;
    info!(
        feed = %config.feed_path.display(),
        cache = %config.cache_path.display(),
        "starting departure board"
    );

    let feed_path = config.feed_path.clone();
    let feed = tokio::task::spawn_blocking(move || ZipFeed::open(feed_path)).await??;
    let store = StopTimeStore::open(&config.store_config()).await?;
    let board = DepartureBoard::open(Arc::new(feed), store, config.clone()).await?;

    let app = create_router(AppState::new(board));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    info!("  GET    /health");
    info!("  GET    /api/stops/search?q=&limit=");
    info!("  GET    /api/stops/:stop_id/departures?limit=&include_children=");
    info!("  GET    /api/trips/:trip_id/route");
    info!("  DELETE /api/stops/:stop_id/cache");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
