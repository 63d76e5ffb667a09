use std::sync::Arc;

use tokio::signal;
use tracing::info;

use fabplan_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    let db_arc = Arc::new(db_pool);

    // Cache: Redis when reachable, in-memory otherwise
    let cache_config = api::cache::CacheConfig {
        enabled: cfg.cache_enabled,
        redis_url: Some(cfg.redis_url.clone()),
        default_ttl_secs: Some(cfg.dashboard_cache_ttl_secs),
    };
    let cache = api::cache::CacheFactory::create_cache(&cache_config).await;

    // Domain-change events drive dashboard cache invalidation
    let (event_sender, event_rx) = api::events::channel(cfg.event_channel_capacity);
    tokio::spawn(api::events::process_events(event_rx, cache.clone()));

    // Aggregate app services used by HTTP handlers
    let services = api::handlers::AppServices::new(db_arc.clone(), cache.clone(), &cfg);

    // Compose shared app state
    let app_state = api::AppState {
        db: db_arc,
        config: cfg.clone(),
        event_sender,
        services,
        cache,
    };

    let app = api::app_router(app_state);

    let addr = cfg.server_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown signal handler: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
