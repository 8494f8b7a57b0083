//! Response shape of the reporting endpoint.
//!
//! The shape is fixed regardless of data volume: empty data produces zeros
//! and empty arrays, never missing fields, so a dashboard can render against
//! a store with no history.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::BrowserInfo;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub overview: Overview,
    pub top_pages: Vec<TopPage>,
    pub devices: DeviceBreakdown,
    pub traffic: TrafficBreakdown,
    pub recent_visits: Vec<RecentVisit>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub today_views: i64,
    pub week_views: i64,
    pub month_views: i64,
    /// Seconds, over records where dwell is non-null and positive.
    pub avg_time_on_page: f64,
    /// Milliseconds, over records where load time is non-null and positive.
    pub avg_page_load_time: f64,
    pub min_page_load_time: f64,
    pub max_page_load_time: f64,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopPage {
    pub path: String,
    pub views: i64,
    /// Rounded average dwell in seconds; 0 when no dwell was ever recorded.
    pub avg_time_on_page: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBreakdown {
    pub types: Vec<DeviceCount>,
    pub browsers: Vec<AgentCount>,
    pub os: Vec<AgentCount>,
    pub screen_resolutions: Vec<BucketCount>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficBreakdown {
    pub referrers: Vec<BucketCount>,
    pub languages: Vec<BucketCount>,
    pub hourly_pattern: Vec<HourCount>,
    pub dark_mode_users: Vec<DarkModeCount>,
    pub countries: Vec<BucketCount>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DeviceCount {
    pub device: String,
    pub count: i64,
}

/// Name/version pair count, used for both browser and OS breakdowns.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct AgentCount {
    pub name: String,
    pub version: String,
    pub count: i64,
}

/// Generic grouped count over a single string dimension.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct BucketCount {
    pub value: String,
    pub count: i64,
}

/// One hour-of-day bucket (0-23, UTC) of the trailing-week traffic pattern.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct HourCount {
    pub hour: i64,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DarkModeCount {
    pub dark_mode: bool,
    pub count: i64,
}

/// Reduced projection used by the recent-visits table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentVisit {
    pub timestamp: i64,
    pub path: String,
    /// Defaults to 0 in the projection when the close beacon never arrived.
    pub time_on_page: i64,
    pub browser: BrowserInfo,
    pub device: String,
}

/// Load-time statistics over records with a positive, non-null sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadTimeStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}
