use axum::{
    http::Method,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::enrich::CountryResolver;
use crate::storage::VisitStore;

use super::handlers::{get_report, health_check, record_visit, AppState};

pub fn create_api_router(
    store: Arc<dyn VisitStore>,
    geo: Arc<CountryResolver>,
    config: Arc<Config>,
) -> Router {
    let state = Arc::new(AppState { store, geo, config });

    // Beacons and dashboard calls may come from another origin; the ingest
    // endpoint carries no credentials so a permissive policy is fine.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/analytics", get(get_report).post(record_visit))
        .layer(cors)
        .with_state(state)
}
