use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use glimpse::api;
use glimpse::config::Config;
use glimpse::enrich::CountryResolver;
use glimpse::storage::{SqliteVisitStore, VisitStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize the visit store
    info!("Using SQLite visit store: {}", config.database.url);
    let store: Arc<dyn VisitStore> = Arc::new(
        SqliteVisitStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.init().await?;
    info!("Visit store initialized");

    let geo = Arc::new(CountryResolver::new(
        &config.geo.base_url,
        Duration::from_millis(config.geo.timeout_ms),
    )?);

    if config.analytics_secret.is_some() {
        info!("🔐 Reporting endpoint secret configured");
    } else {
        info!("🔓 ANALYTICS_SECRET not set - the reporting endpoint will refuse all requests");
    }

    let app = api::create_api_router(Arc::clone(&store), geo, Arc::new(config.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Analytics server listening on http://{}", addr);
    info!("   - Ingestion:  POST http://{}/api/analytics", addr);
    info!("   - Reporting:  GET  http://{}/api/analytics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
