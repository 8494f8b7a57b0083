use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{authorize_report, ReportAuthError};
use crate::config::Config;
use crate::enrich::{client_ip, parse_user_agent, CountryResolver};
use crate::models::{IngestEvent, IngestResponse, VisitRecord};
use crate::report::build_report;
use crate::storage::VisitStore;

pub struct AppState {
    pub store: Arc<dyn VisitStore>,
    pub geo: Arc<CountryResolver>,
    pub config: Arc<Config>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Ingest a capture-agent event.
///
/// The body is read as raw bytes because beacon sends arrive with a
/// text/plain content type. Every path answers HTTP 200: telemetry must
/// never become a source of user-visible failures, so internal faults are
/// logged and reported as `success: false`.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<IngestResponse> {
    let event: IngestEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Malformed analytics payload: {}", e);
            return Json(IngestResponse::failure());
        }
    };

    match ingest(&state, &headers, event).await {
        Ok(response) => Json(response),
        Err(e) => {
            error!("Failed to record visit: {}", e);
            Json(IngestResponse::failure())
        }
    }
}

async fn ingest(
    state: &AppState,
    headers: &HeaderMap,
    event: IngestEvent,
) -> anyhow::Result<IngestResponse> {
    let now = Utc::now().timestamp();

    if event.is_update {
        if let Some(page_id) = event.page_id.as_deref() {
            let seconds = event.time_on_page.unwrap_or(0);
            let matched = state.store.set_time_on_page(page_id, seconds, now).await?;
            if !matched {
                // Beacon delivery raced ahead of create persistence; tolerated.
                debug!("Dwell update for unknown pageId {}", page_id);
            }
            return Ok(IngestResponse::updated());
        }
    }

    let user_agent = match event.user_agent {
        Some(ua) => ua,
        None => headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };
    let parsed = parse_user_agent(&user_agent);

    let ip_address = client_ip(headers);
    let country = state.geo.lookup(ip_address.as_deref()).await;

    let record = VisitRecord {
        user_id: event.user_id,
        session_id: event.session_id,
        page_id: event.page_id,
        timestamp: now,
        url: event.url,
        path: event.path,
        referrer: event.referrer,
        title: event.title,
        user_agent,
        browser: parsed.browser,
        os: parsed.os,
        device: parsed.device,
        screen_resolution: event.screen_resolution,
        viewport_size: event.viewport_size,
        color_depth: event.color_depth,
        ip_address,
        country,
        page_load_time: event.page_load_time,
        time_on_page: None,
        last_updated: None,
        language: event.language,
        timezone: event.timezone,
        is_dark_mode: event.is_dark_mode,
    };

    state.store.insert(&record).await?;
    Ok(IngestResponse::created())
}

/// Run the aggregation battery and return the consolidated report.
pub async fn get_report(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize_report(&headers, state.config.analytics_secret.as_deref()) {
        return match e {
            ReportAuthError::Unconfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Analytics secret not configured".to_string(),
                }),
            )
                .into_response(),
            ReportAuthError::Invalid => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Unauthorized".to_string(),
                }),
            )
                .into_response(),
        };
    }

    match build_report(state.store.as_ref()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Failed to build analytics report: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch analytics".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
