//! Report assembly: the fixed aggregation battery plus display formatting
//!
//! All queries are independent and read-only, so they run concurrently in a
//! single `try_join!`. Time windows are computed in unix-second arithmetic,
//! which keeps every boundary (start of today, trailing week/month, hourly
//! buckets) in UTC.

use anyhow::Result;
use chrono::Utc;

use crate::models::{DeviceBreakdown, Overview, Report, TrafficBreakdown};
use crate::storage::VisitStore;

const TOP_LIMIT: i64 = 10;
const RECENT_LIMIT: i64 = 20;
const DAY_SECS: i64 = 86_400;

pub async fn build_report(store: &dyn VisitStore) -> Result<Report> {
    let now = Utc::now().timestamp();
    let today_start = now - now.rem_euclid(DAY_SECS);
    let week_ago = now - 7 * DAY_SECS;
    let month_ago = now - 30 * DAY_SECS;

    let (
        total_views,
        unique_visitors,
        today_views,
        week_views,
        month_views,
        top_pages,
        device_types,
        browsers,
        os,
        languages,
        screen_resolutions,
        referrers,
        countries,
        avg_time_on_page,
        load_times,
        hourly_pattern,
        dark_mode_users,
        recent_visits,
    ) = tokio::try_join!(
        store.count_all(),
        store.unique_visitors(),
        store.count_since(today_start),
        store.count_since(week_ago),
        store.count_since(month_ago),
        store.top_pages(TOP_LIMIT),
        store.device_counts(),
        store.browser_counts(TOP_LIMIT),
        store.os_counts(TOP_LIMIT),
        store.language_counts(TOP_LIMIT),
        store.screen_resolution_counts(TOP_LIMIT),
        store.referrer_counts(TOP_LIMIT),
        store.country_counts(TOP_LIMIT),
        store.avg_time_on_page(),
        store.load_time_stats(),
        store.hourly_pattern(week_ago),
        store.dark_mode_counts(),
        store.recent_visits(RECENT_LIMIT),
    )?;

    Ok(Report {
        overview: Overview {
            total_views,
            unique_visitors,
            today_views,
            week_views,
            month_views,
            avg_time_on_page,
            avg_page_load_time: load_times.avg,
            min_page_load_time: load_times.min,
            max_page_load_time: load_times.max,
        },
        top_pages,
        devices: DeviceBreakdown {
            types: device_types,
            browsers,
            os,
            screen_resolutions,
        },
        traffic: TrafficBreakdown {
            referrers,
            languages,
            hourly_pattern,
            dark_mode_users,
            countries,
        },
        recent_visits,
    })
}

/// Dwell-time display format: "45s", "2m 5s".
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Load-time display format: "850ms", "2.35s".
pub fn format_load_time(ms: f64) -> String {
    let abs = ms.abs();
    if abs < 1000.0 {
        format!("{}ms", abs.round() as i64)
    } else {
        format!("{:.2}s", abs / 1000.0)
    }
}
