use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    AgentCount, BucketCount, DarkModeCount, DeviceCount, HourCount, LoadTimeStats, RecentVisit,
    TopPage, VisitRecord,
};

/// Repository interface over the visit collection.
///
/// Each reporting aggregation is an independent, named, read-only query so
/// the battery can be composed in parallel and the storage engine swapped
/// without touching the report assembly.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Initialize the storage (create tables, indexes, etc.)
    async fn init(&self) -> Result<()>;

    /// Persist a new visit record. `page_id` is unique when present; records
    /// without one (the agent never issued an id) insert freely.
    async fn insert(&self, record: &VisitRecord) -> Result<()>;

    /// Patch the dwell time of the record matching `page_id`, setting
    /// `last_updated` alongside. Returns false when no record matched -
    /// the beacon-before-create race, tolerated as a silent no-op.
    async fn set_time_on_page(&self, page_id: &str, seconds: i64, updated_at: i64)
        -> Result<bool>;

    /// Total record count, all time.
    async fn count_all(&self) -> Result<i64>;

    /// Record count with `timestamp >= since` (unix seconds).
    async fn count_since(&self, since: i64) -> Result<i64>;

    /// Distinct `user_id` count.
    async fn unique_visitors(&self) -> Result<i64>;

    /// Paths by view count, with per-path average dwell (nulls ignored).
    async fn top_pages(&self, limit: i64) -> Result<Vec<TopPage>>;

    /// Counts grouped by device category.
    async fn device_counts(&self) -> Result<Vec<DeviceCount>>;

    /// Counts grouped by browser name/version pairs.
    async fn browser_counts(&self, limit: i64) -> Result<Vec<AgentCount>>;

    /// Counts grouped by OS name/version pairs.
    async fn os_counts(&self, limit: i64) -> Result<Vec<AgentCount>>;

    /// Counts grouped by language tag.
    async fn language_counts(&self, limit: i64) -> Result<Vec<BucketCount>>;

    /// Counts grouped by screen resolution.
    async fn screen_resolution_counts(&self, limit: i64) -> Result<Vec<BucketCount>>;

    /// Counts grouped by referrer, excluding empty and localhost referrers.
    async fn referrer_counts(&self, limit: i64) -> Result<Vec<BucketCount>>;

    /// Counts grouped by resolved country, excluding unresolved records.
    async fn country_counts(&self, limit: i64) -> Result<Vec<BucketCount>>;

    /// Mean dwell in seconds over records where it is non-null and positive.
    async fn avg_time_on_page(&self) -> Result<f64>;

    /// Mean/min/max load time over records where it is non-null and positive.
    async fn load_time_stats(&self) -> Result<LoadTimeStats>;

    /// Hour-of-day (UTC) histogram of records with `timestamp >= since`.
    async fn hourly_pattern(&self, since: i64) -> Result<Vec<HourCount>>;

    /// Counts grouped by dark-mode preference.
    async fn dark_mode_counts(&self) -> Result<Vec<DarkModeCount>>;

    /// Most recent records, newest first, projected to the reduced field set.
    async fn recent_visits(&self, limit: i64) -> Result<Vec<RecentVisit>>;
}
