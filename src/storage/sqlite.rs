use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{
    AgentCount, BrowserInfo, BucketCount, DarkModeCount, DeviceCount, HourCount, LoadTimeStats,
    RecentVisit, TopPage, VisitRecord,
};
use crate::storage::VisitStore;

pub struct SqliteVisitStore {
    pool: Arc<SqlitePool>,
}

impl SqliteVisitStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl VisitStore for SqliteVisitStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                page_id TEXT UNIQUE,
                user_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                url TEXT NOT NULL,
                path TEXT NOT NULL,
                referrer TEXT,
                title TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                browser_name TEXT NOT NULL,
                browser_version TEXT NOT NULL,
                os_name TEXT NOT NULL,
                os_version TEXT NOT NULL,
                device TEXT NOT NULL,
                screen_resolution TEXT NOT NULL,
                viewport_size TEXT NOT NULL,
                color_depth INTEGER NOT NULL,
                ip_address TEXT,
                country TEXT,
                page_load_time REAL,
                time_on_page INTEGER,
                last_updated INTEGER,
                language TEXT NOT NULL,
                timezone TEXT NOT NULL,
                is_dark_mode INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_timestamp ON visits(timestamp)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_path ON visits(path)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert(&self, record: &VisitRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO visits (
                page_id, user_id, session_id, timestamp,
                url, path, referrer, title,
                user_agent, browser_name, browser_version, os_name, os_version, device,
                screen_resolution, viewport_size, color_depth,
                ip_address, country,
                page_load_time, time_on_page, last_updated,
                language, timezone, is_dark_mode
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.page_id)
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(record.timestamp)
        .bind(&record.url)
        .bind(&record.path)
        .bind(&record.referrer)
        .bind(&record.title)
        .bind(&record.user_agent)
        .bind(&record.browser.name)
        .bind(&record.browser.version)
        .bind(&record.os.name)
        .bind(&record.os.version)
        .bind(record.device.as_str())
        .bind(&record.screen_resolution)
        .bind(&record.viewport_size)
        .bind(record.color_depth)
        .bind(&record.ip_address)
        .bind(&record.country)
        .bind(record.page_load_time)
        .bind(record.time_on_page)
        .bind(record.last_updated)
        .bind(&record.language)
        .bind(&record.timezone)
        .bind(record.is_dark_mode)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn set_time_on_page(
        &self,
        page_id: &str,
        seconds: i64,
        updated_at: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE visits
            SET time_on_page = ?, last_updated = ?
            WHERE page_id = ?
            "#,
        )
        .bind(seconds)
        .bind(updated_at)
        .bind(page_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_since(&self, since: i64) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM visits WHERE timestamp >= ?")
                .bind(since)
                .fetch_one(self.pool.as_ref())
                .await?;
        Ok(count)
    }

    async fn unique_visitors(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM visits")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(count)
    }

    async fn top_pages(&self, limit: i64) -> Result<Vec<TopPage>> {
        let pages = sqlx::query_as::<_, TopPage>(
            r#"
            SELECT
                path,
                COUNT(*) AS views,
                CAST(ROUND(COALESCE(AVG(time_on_page), 0)) AS INTEGER) AS avg_time_on_page
            FROM visits
            GROUP BY path
            ORDER BY views DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(pages)
    }

    async fn device_counts(&self) -> Result<Vec<DeviceCount>> {
        let counts = sqlx::query_as::<_, DeviceCount>(
            r#"
            SELECT device, COUNT(*) AS count
            FROM visits
            GROUP BY device
            ORDER BY count DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn browser_counts(&self, limit: i64) -> Result<Vec<AgentCount>> {
        let counts = sqlx::query_as::<_, AgentCount>(
            r#"
            SELECT browser_name AS name, browser_version AS version, COUNT(*) AS count
            FROM visits
            GROUP BY browser_name, browser_version
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn os_counts(&self, limit: i64) -> Result<Vec<AgentCount>> {
        let counts = sqlx::query_as::<_, AgentCount>(
            r#"
            SELECT os_name AS name, os_version AS version, COUNT(*) AS count
            FROM visits
            GROUP BY os_name, os_version
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn language_counts(&self, limit: i64) -> Result<Vec<BucketCount>> {
        let counts = sqlx::query_as::<_, BucketCount>(
            r#"
            SELECT language AS value, COUNT(*) AS count
            FROM visits
            GROUP BY language
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn screen_resolution_counts(&self, limit: i64) -> Result<Vec<BucketCount>> {
        let counts = sqlx::query_as::<_, BucketCount>(
            r#"
            SELECT screen_resolution AS value, COUNT(*) AS count
            FROM visits
            GROUP BY screen_resolution
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn referrer_counts(&self, limit: i64) -> Result<Vec<BucketCount>> {
        let counts = sqlx::query_as::<_, BucketCount>(
            r#"
            SELECT referrer AS value, COUNT(*) AS count
            FROM visits
            WHERE referrer IS NOT NULL
              AND referrer != ''
              AND referrer NOT LIKE 'http://localhost%'
              AND referrer NOT LIKE 'https://localhost%'
            GROUP BY referrer
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn country_counts(&self, limit: i64) -> Result<Vec<BucketCount>> {
        let counts = sqlx::query_as::<_, BucketCount>(
            r#"
            SELECT country AS value, COUNT(*) AS count
            FROM visits
            WHERE country IS NOT NULL
            GROUP BY country
            ORDER BY count DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn avg_time_on_page(&self) -> Result<f64> {
        // Null dwell means "close beacon never arrived" and must not drag the
        // average toward zero; the filter keeps only observed, positive dwell.
        let avg = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(time_on_page)
            FROM visits
            WHERE time_on_page IS NOT NULL AND time_on_page > 0
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(avg.unwrap_or(0.0))
    }

    async fn load_time_stats(&self) -> Result<LoadTimeStats> {
        let (avg, min, max) = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>)>(
            r#"
            SELECT AVG(page_load_time), MIN(page_load_time), MAX(page_load_time)
            FROM visits
            WHERE page_load_time IS NOT NULL AND page_load_time > 0
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LoadTimeStats {
            avg: avg.unwrap_or(0.0),
            min: min.unwrap_or(0.0),
            max: max.unwrap_or(0.0),
        })
    }

    async fn hourly_pattern(&self, since: i64) -> Result<Vec<HourCount>> {
        // Hour-of-day by pure unix-second arithmetic: bucketing is UTC by
        // construction, independent of the server's local timezone.
        let counts = sqlx::query_as::<_, HourCount>(
            r#"
            SELECT (timestamp % 86400) / 3600 AS hour, COUNT(*) AS count
            FROM visits
            WHERE timestamp >= ?
            GROUP BY hour
            ORDER BY hour ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn dark_mode_counts(&self) -> Result<Vec<DarkModeCount>> {
        let counts = sqlx::query_as::<_, DarkModeCount>(
            r#"
            SELECT is_dark_mode AS dark_mode, COUNT(*) AS count
            FROM visits
            GROUP BY is_dark_mode
            ORDER BY is_dark_mode DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(counts)
    }

    async fn recent_visits(&self, limit: i64) -> Result<Vec<RecentVisit>> {
        let rows = sqlx::query_as::<_, (i64, String, i64, String, String, String)>(
            r#"
            SELECT timestamp, path, COALESCE(time_on_page, 0),
                   browser_name, browser_version, device
            FROM visits
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(timestamp, path, time_on_page, name, version, device)| RecentVisit {
                    timestamp,
                    path,
                    time_on_page,
                    browser: BrowserInfo { name, version },
                    device,
                },
            )
            .collect())
    }
}
