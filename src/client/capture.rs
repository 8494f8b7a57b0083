//! Page-view capture agent
//!
//! One agent instance tracks one mounted route. Entering a page emits a
//! single create event (the idempotent-arm guard absorbs re-renders);
//! leaving it emits the dwell-time update through the transport's
//! teardown-safe final send. Delivery is best-effort end to end: the
//! returned [`Delivery`] may be discarded and nothing here ever raises
//! toward the surrounding page.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::client::identity::{new_client_id, IdentityResolver};
use crate::client::now_ms;
use crate::client::store::KeyValueStore;

/// Paths the agent never reports on; the reporting dashboard must not
/// track itself.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &["/analytics"];

/// Lifecycle of one tracked page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Armed,
    Sent,
    Done,
}

/// Outcome of a best-effort send. Callers are free to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Dropped,
}

#[async_trait]
pub trait BeaconTransport: Send + Sync {
    /// Fire-and-forget send for the create event.
    async fn send(&self, payload: Value) -> Delivery;

    /// Guaranteed-attempt send for the close event, expected to complete
    /// even while the host page is being torn down.
    async fn send_final(&self, payload: Value) -> Delivery {
        self.send(payload).await
    }
}

/// Synchronously-readable environment snapshot taken on route entry.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub path: String,
    pub referrer: Option<String>,
    pub title: String,
    pub user_agent: String,
    pub screen_resolution: String,
    pub viewport_size: String,
    pub color_depth: i64,
    /// Navigation-timing sample in milliseconds, if available.
    pub page_load_time: Option<f64>,
    pub language: String,
    pub timezone: String,
    pub is_dark_mode: bool,
}

pub struct CaptureAgent<T, D, S> {
    transport: T,
    identity: IdentityResolver<D, S>,
    excluded_paths: Vec<String>,
    phase: CapturePhase,
    page_id: Option<String>,
    armed_at_ms: i64,
}

impl<T, D, S> CaptureAgent<T, D, S>
where
    T: BeaconTransport,
    D: KeyValueStore,
    S: KeyValueStore,
{
    pub fn new(transport: T, identity: IdentityResolver<D, S>) -> Self {
        Self {
            transport,
            identity,
            excluded_paths: DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            phase: CapturePhase::Idle,
            page_id: None,
            armed_at_ms: 0,
        }
    }

    pub fn with_excluded_paths(mut self, paths: Vec<String>) -> Self {
        self.excluded_paths = paths;
        self
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Emit the "page opened" event for a newly entered route.
    ///
    /// Exactly one create is sent per mounted route instance; repeated calls
    /// without an intervening [`reset`](Self::reset) are no-ops, as are
    /// excluded paths.
    pub async fn enter_page(&mut self, snapshot: &PageSnapshot) -> Delivery {
        self.enter_page_at(snapshot, now_ms()).await
    }

    pub async fn enter_page_at(&mut self, snapshot: &PageSnapshot, now_ms: i64) -> Delivery {
        if self.phase != CapturePhase::Idle {
            return Delivery::Dropped;
        }
        if self.excluded_paths.iter().any(|p| p == &snapshot.path) {
            return Delivery::Dropped;
        }

        self.phase = CapturePhase::Armed;
        self.armed_at_ms = now_ms;
        let page_id = new_client_id("page", now_ms);

        let load_time = snapshot.page_load_time.unwrap_or(0.0).max(0.0);
        let payload = json!({
            "userId": self.identity.user_id_at(now_ms),
            "sessionId": self.identity.session_id_at(now_ms),
            "pageId": page_id,
            "url": snapshot.url,
            "path": snapshot.path,
            "referrer": snapshot.referrer,
            "title": snapshot.title,
            "userAgent": snapshot.user_agent,
            "screenResolution": snapshot.screen_resolution,
            "viewportSize": snapshot.viewport_size,
            "colorDepth": snapshot.color_depth,
            "pageLoadTime": load_time,
            "language": snapshot.language,
            "timezone": snapshot.timezone,
            "isDarkMode": snapshot.is_dark_mode,
        });

        self.page_id = Some(page_id);
        let outcome = self.transport.send(payload).await;
        self.phase = CapturePhase::Sent;
        outcome
    }

    /// Emit the "page closed" event carrying whole-second dwell time.
    ///
    /// Only fires if a create was sent, and at most once; ordering with the
    /// create is causal only (the update carries a `pageId` the create
    /// issued), so the server tolerates out-of-order delivery.
    pub async fn leave_page(&mut self) -> Delivery {
        self.leave_page_at(now_ms()).await
    }

    pub async fn leave_page_at(&mut self, now_ms: i64) -> Delivery {
        if self.phase != CapturePhase::Sent {
            return Delivery::Dropped;
        }
        let page_id = match self.page_id.clone() {
            Some(id) => id,
            None => return Delivery::Dropped,
        };

        let elapsed_ms = (now_ms - self.armed_at_ms).max(0);
        let seconds = (elapsed_ms as f64 / 1000.0).round() as i64;
        let payload = json!({
            "pageId": page_id,
            "timeOnPage": seconds,
            "isUpdate": true,
        });

        let outcome = self.transport.send_final(payload).await;
        self.phase = CapturePhase::Done;
        outcome
    }

    /// Re-arm for the next mount (component unmounted, route changed).
    pub fn reset(&mut self) {
        self.phase = CapturePhase::Idle;
        self.page_id = None;
        self.armed_at_ms = 0;
    }
}

/// Reqwest-backed transport posting JSON to the ingestion endpoint.
///
/// The short timeout keeps the final send inside the teardown budget; every
/// failure is logged at debug and swallowed.
pub struct HttpBeacon {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBeacon {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl BeaconTransport for HttpBeacon {
    async fn send(&self, payload: Value) -> Delivery {
        match self.client.post(&self.endpoint).json(&payload).send().await {
            Ok(response) if response.status().is_success() => Delivery::Delivered,
            Ok(response) => {
                debug!("Beacon rejected with status {}", response.status());
                Delivery::Dropped
            }
            Err(e) => {
                debug!("Beacon send failed: {}", e);
                Delivery::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Value>>,
        finals: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl BeaconTransport for RecordingTransport {
        async fn send(&self, payload: Value) -> Delivery {
            self.sent.lock().unwrap().push(payload);
            Delivery::Delivered
        }

        async fn send_final(&self, payload: Value) -> Delivery {
            self.finals.lock().unwrap().push(payload);
            Delivery::Delivered
        }
    }

    fn agent() -> CaptureAgent<RecordingTransport, MemoryStore, MemoryStore> {
        CaptureAgent::new(
            RecordingTransport::default(),
            IdentityResolver::new(MemoryStore::new(), MemoryStore::new()),
        )
    }

    fn snapshot(path: &str) -> PageSnapshot {
        PageSnapshot {
            url: format!("https://example.com{}", path),
            path: path.to_string(),
            referrer: None,
            title: "Example".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            screen_resolution: "1920x1080".to_string(),
            viewport_size: "1200x800".to_string(),
            color_depth: 24,
            page_load_time: Some(320.0),
            language: "en-US".to_string(),
            timezone: "Europe/Berlin".to_string(),
            is_dark_mode: true,
        }
    }

    #[tokio::test]
    async fn one_create_per_mount() {
        let mut agent = agent();
        assert_eq!(
            agent.enter_page_at(&snapshot("/blog"), 1_000).await,
            Delivery::Delivered
        );
        // A re-render must not duplicate the send.
        assert_eq!(
            agent.enter_page_at(&snapshot("/blog"), 2_000).await,
            Delivery::Dropped
        );
        assert_eq!(agent.transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn excluded_path_stays_idle() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/analytics"), 1_000).await;
        assert_eq!(agent.phase(), CapturePhase::Idle);
        assert!(agent.transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_payload_carries_the_snapshot() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/blog"), 1_000).await;

        let sent = agent.transport.sent.lock().unwrap();
        let payload = &sent[0];
        assert_eq!(payload["path"], "/blog");
        assert_eq!(payload["screenResolution"], "1920x1080");
        assert_eq!(payload["colorDepth"], 24);
        assert_eq!(payload["isDarkMode"], true);
        assert_eq!(payload["pageLoadTime"], 320.0);
        assert!(payload["pageId"].as_str().unwrap().starts_with("page_1000_"));
        assert!(payload["userId"].as_str().unwrap().starts_with("user_"));
        assert!(payload["sessionId"].as_str().unwrap().starts_with("session_"));
    }

    #[tokio::test]
    async fn negative_load_time_is_clamped() {
        let mut agent = agent();
        let mut snap = snapshot("/blog");
        snap.page_load_time = Some(-15.0);
        agent.enter_page_at(&snap, 1_000).await;
        assert_eq!(agent.transport.sent.lock().unwrap()[0]["pageLoadTime"], 0.0);
    }

    #[tokio::test]
    async fn missing_load_time_defaults_to_zero() {
        let mut agent = agent();
        let mut snap = snapshot("/blog");
        snap.page_load_time = None;
        agent.enter_page_at(&snap, 1_000).await;
        assert_eq!(agent.transport.sent.lock().unwrap()[0]["pageLoadTime"], 0.0);
    }

    #[tokio::test]
    async fn leave_sends_whole_second_dwell_with_matching_page_id() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/blog"), 10_000).await;
        agent.leave_page_at(135_200).await;

        let sent = agent.transport.sent.lock().unwrap();
        let finals = agent.transport.finals.lock().unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0]["isUpdate"], true);
        assert_eq!(finals[0]["timeOnPage"], 125);
        assert_eq!(finals[0]["pageId"], sent[0]["pageId"]);
        assert_eq!(agent.phase(), CapturePhase::Done);
    }

    #[tokio::test]
    async fn leave_without_enter_is_a_noop() {
        let mut agent = agent();
        assert_eq!(agent.leave_page_at(5_000).await, Delivery::Dropped);
        assert!(agent.transport.finals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn leave_fires_at_most_once() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/blog"), 1_000).await;
        agent.leave_page_at(2_000).await;
        assert_eq!(agent.leave_page_at(3_000).await, Delivery::Dropped);
        assert_eq!(agent.transport.finals.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_rearms_for_the_next_mount() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/blog"), 1_000).await;
        agent.leave_page_at(2_000).await;
        agent.reset();
        assert_eq!(
            agent.enter_page_at(&snapshot("/projects"), 3_000).await,
            Delivery::Delivered
        );
        assert_eq!(agent.transport.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn session_is_shared_across_mounts() {
        let mut agent = agent();
        agent.enter_page_at(&snapshot("/blog"), 1_000).await;
        agent.reset();
        agent.enter_page_at(&snapshot("/projects"), 2_000).await;

        let sent = agent.transport.sent.lock().unwrap();
        assert_eq!(sent[0]["sessionId"], sent[1]["sessionId"]);
        assert_eq!(sent[0]["userId"], sent[1]["userId"]);
        assert_ne!(sent[0]["pageId"], sent[1]["pageId"]);
    }
}
