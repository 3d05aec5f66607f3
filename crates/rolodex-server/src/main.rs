use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rolodex_shared::clock::SystemClock;
use rolodex_store::{MemoryProfileStore, ProfileStore, SqliteProfileStore};

use rolodex_server::{AppState, RecordCatalog, ServerConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rolodex_server=debug")),
        )
        .init();

    info!("Starting Rolodex server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        daily_limit = config.daily_limit,
        backend = ?config.store_backend,
        admin_api = config.admin_token.is_some(),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let store: Arc<dyn ProfileStore> = match config.store_backend {
        StoreBackend::Sqlite => {
            let store = match &config.database_path {
                Some(path) => SqliteProfileStore::open_at(path)?,
                None => SqliteProfileStore::open_default()?,
            };
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory profile store; quotas reset on restart");
            Arc::new(MemoryProfileStore::new())
        }
    };

    let catalog = RecordCatalog::load(&config)?;
    let http_addr = config.http_addr;
    let app_state = AppState::new(config, store, Arc::new(SystemClock), catalog);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // Periodic per-user lock cleanup (every 10 minutes)
    let locks = app_state.locks.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            locks.purge_idle().await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = rolodex_server::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
