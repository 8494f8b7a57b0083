//! Per-browser and per-session visit identity
//!
//! The user identifier is created once and persisted indefinitely in the
//! durable store. The session identifier lives in session-scoped storage
//! and rotates after 30 minutes of inactivity; every read refreshes the
//! last-activity marker.

use rand::RngExt;

use crate::client::now_ms;
use crate::client::store::KeyValueStore;

const USER_ID_KEY: &str = "analytics_user_id";
const SESSION_ID_KEY: &str = "analytics_session_id";
const LAST_ACTIVITY_KEY: &str = "analytics_last_activity";

pub const SESSION_TIMEOUT_MS: i64 = 30 * 60 * 1000;

const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `"{prefix}_{millis}_{random base-36 suffix}"`.
pub fn new_client_id(prefix: &str, now_ms: i64) -> String {
    format!("{}_{}_{}", prefix, now_ms, random_suffix())
}

/// Fresh identifier for a single page view.
pub fn new_page_id() -> String {
    new_client_id("page", now_ms())
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

pub struct IdentityResolver<D, S> {
    durable: D,
    session: S,
}

impl<D: KeyValueStore, S: KeyValueStore> IdentityResolver<D, S> {
    pub fn new(durable: D, session: S) -> Self {
        Self { durable, session }
    }

    pub fn user_id(&self) -> String {
        self.user_id_at(now_ms())
    }

    pub fn user_id_at(&self, now_ms: i64) -> String {
        if let Some(existing) = self.durable.get(USER_ID_KEY) {
            return existing;
        }

        let id = new_client_id("user", now_ms);
        self.durable.set(USER_ID_KEY, &id);
        id
    }

    pub fn session_id(&self) -> String {
        self.session_id_at(now_ms())
    }

    pub fn session_id_at(&self, now_ms: i64) -> String {
        if let (Some(existing), Some(last)) = (
            self.session.get(SESSION_ID_KEY),
            self.session.get(LAST_ACTIVITY_KEY),
        ) {
            if let Ok(last_ms) = last.parse::<i64>() {
                if now_ms - last_ms < SESSION_TIMEOUT_MS {
                    self.session.set(LAST_ACTIVITY_KEY, &now_ms.to_string());
                    return existing;
                }
            }
        }

        let id = new_client_id("session", now_ms);
        self.session.set(SESSION_ID_KEY, &id);
        self.session.set(LAST_ACTIVITY_KEY, &now_ms.to_string());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::MemoryStore;
    use std::collections::HashSet;

    fn resolver() -> IdentityResolver<MemoryStore, MemoryStore> {
        IdentityResolver::new(MemoryStore::new(), MemoryStore::new())
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(new_client_id("page", 1_700_000_000_000)));
        }
    }

    #[test]
    fn id_scheme_has_prefix_millis_and_suffix() {
        let id = new_client_id("user", 1_700_000_000_000);
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "user");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn user_id_is_created_once_and_persisted() {
        let resolver = resolver();
        let first = resolver.user_id_at(1_000);
        let second = resolver.user_id_at(2_000);
        assert_eq!(first, second);
        assert!(first.starts_with("user_1000_"));
    }

    #[test]
    fn session_survives_activity_under_the_window() {
        let resolver = resolver();
        let t0 = 1_000_000;
        let first = resolver.session_id_at(t0);
        let second = resolver.session_id_at(t0 + SESSION_TIMEOUT_MS - 1);
        assert_eq!(first, second);
    }

    #[test]
    fn session_rotates_after_the_window_lapses() {
        let resolver = resolver();
        let t0 = 1_000_000;
        let first = resolver.session_id_at(t0);
        let second = resolver.session_id_at(t0 + SESSION_TIMEOUT_MS);
        assert_ne!(first, second);
    }

    #[test]
    fn each_call_refreshes_the_activity_marker() {
        let resolver = resolver();
        let t0 = 1_000_000;
        let first = resolver.session_id_at(t0);
        // Two reads 20 minutes apart each, 40 minutes total: still one session
        // because the marker was refreshed in between.
        let mid = resolver.session_id_at(t0 + 20 * 60 * 1000);
        let last = resolver.session_id_at(t0 + 40 * 60 * 1000);
        assert_eq!(first, mid);
        assert_eq!(mid, last);
    }

    #[test]
    fn corrupt_activity_marker_rotates_the_session() {
        let resolver = resolver();
        let first = resolver.session_id_at(1_000);
        resolver.session.set("analytics_last_activity", "garbage");
        let second = resolver.session_id_at(2_000);
        assert_ne!(first, second);
    }
}
