//! ShareCache - a persistent cache and WeChat share-signature server
//!
//! Boots the store, the codec registry, the credential refresh task and
//! the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharecache::api::{create_router, AppState};
use sharecache::cache::{CodecRegistry, TtlCache};
use sharecache::config::Config;
use sharecache::models::{PageList, SignPackage};
use sharecache::store::CacheStore;
use sharecache::tasks::spawn_refresh_task;
use sharecache::wx::{WxClient, WxJsSdk};

/// Main entry point for the share cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the persistent store and build the cache over it
/// 4. Start the periodic credential refresh task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharecache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ShareCache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: data_dir={}, map_size={}MB, port={}, refresh_interval={}s",
        config.data_dir.display(),
        config.map_size_mb,
        config.server_port,
        config.refresh_interval
    );

    // Open the persistent store
    let store = Arc::new(
        CacheStore::open(&config.data_dir, config.map_size_mb)
            .expect("Failed to open the cache store"),
    );

    // Register the message types the cache decodes
    let mut registry = CodecRegistry::new();
    registry.register::<SignPackage>();
    registry.register::<PageList>();

    let cache = Arc::new(TtlCache::new(store, registry));
    info!("Cache store initialized");

    // Build the signature provider over the credential client
    let client = WxClient::new(config.wx_app_id.clone(), config.wx_app_secret.clone())
        .expect("Failed to create the WeChat client");
    let sdk = Arc::new(WxJsSdk::new(
        Arc::clone(&cache),
        Arc::new(client),
        config.wx_app_id.clone(),
    ));

    // Start the periodic credential refresh task
    let refresh_handle = spawn_refresh_task(Arc::clone(&sdk), config.refresh_interval);
    info!("Credential refresh task started");

    // Create router with all endpoints
    let state = AppState::new(cache, sdk, &config);
    let app = create_router(state, &config.allowed_origins);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_handle))
        .await
        .unwrap();

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the refresh task and allows graceful shutdown.
async fn shutdown_signal(refresh_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    // Abort the refresh task
    refresh_handle.abort();
    warn!("Credential refresh task aborted");
}
