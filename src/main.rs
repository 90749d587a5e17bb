mod api;
mod config;
mod storage;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::storage::{seed, ReviewStore};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_tracing(&config.logging.level)?;

    info!("🚀 Starting Ramen Review API Server");
    info!("📋 Configuration loaded");
    info!("   - Database: {:?}", config.storage.database_path);
    info!("   - Seed file: {:?}", config.storage.seed_path);
    info!("   - Server: {}", config.bind_addr());

    // Initialize storage
    info!("💾 Initializing review storage...");
    if let Some(parent) = config.storage.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }
    }
    let store = ReviewStore::new(&config.storage.database_path);

    if config.storage.seed_on_startup {
        let loaded = seed::load_seed(&store, &config.storage.seed_path).with_context(|| {
            format!("Failed to seed reviews from {:?}", config.storage.seed_path)
        })?;
        info!("🌱 Seeded {} reviews", loaded);
    } else {
        store.initialize()?;
    }

    let review_count = store.count_reviews()?;
    info!("✅ Review storage ready ({} reviews)", review_count);

    // Build router with modular routes
    let app = api::router(AppState::new(store));

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET    /health                      - Health check");
    info!("   GET    /reviews                     - List reviews");
    info!("   POST   /reviews                     - Create review");
    info!("   GET    /reviews/{{id}}                - Get review");
    info!("   PUT    /reviews/{{id}}                - Update review");
    info!("   DELETE /reviews/{{id}}                - Delete review");
    info!("   GET    /reviews/country/{{country}}   - Filter by country");
    info!("   GET    /reviews/text/{{partialtext}}  - Search by type");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level: {}", level))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
