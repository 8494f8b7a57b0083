//! Capture-side SDK: visit identity and the page-view capture agent
//!
//! Host environments (a webview shell, a desktop wrapper, an SSR runtime)
//! inject their own key-value storage and transport; everything here is
//! client-local state with best-effort delivery.

pub mod capture;
pub mod identity;
pub mod store;

pub use capture::{BeaconTransport, CaptureAgent, CapturePhase, Delivery, HttpBeacon, PageSnapshot};
pub use identity::IdentityResolver;
pub use store::{KeyValueStore, MemoryStore};

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
