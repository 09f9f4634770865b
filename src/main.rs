//! Storefront Cache - demo storefront API behind a response cache.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::cache::system_clock;
use storefront_cache::repository::InMemoryRepository;
use storefront_cache::{create_router, spawn_cleanup_task, AppState, Config, SharedCache};

/// Main entry point for the storefront server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the seeded repository and the shared response cache
/// 4. Start the optional expiry sweep
/// 5. Serve until SIGINT/SIGTERM, then dispose of the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront cache server");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        product_ttl_ms = config.product_ttl.as_millis() as u64,
        product_list_ttl_ms = config.product_list_ttl.as_millis() as u64,
        cart_ttl_ms = config.cart_ttl.as_millis() as u64,
        admin_ttl_ms = config.admin_ttl.as_millis() as u64,
        max_entries = ?config.max_entries,
        invalidate_lists_on_product_write = config.invalidate_lists_on_product_write,
        "Configuration loaded"
    );

    let repo = Arc::new(InMemoryRepository::seeded());
    let cache = SharedCache::from_config(&config, system_clock());
    let state = AppState::new(repo, cache.clone(), config.clone());

    let sweeper = config
        .sweep_interval
        .map(|interval| spawn_cleanup_task(cache.clone(), interval));
    if sweeper.is_none() {
        info!("Expiry sweep disabled, entries expire lazily on read");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
        info!("Expiry sweep aborted");
    }
    cache.dispose().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
