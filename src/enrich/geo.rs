//! Best-effort IP-to-country resolution over plain HTTP
//!
//! The lookup contract is "never block record creation": private and absent
//! addresses short-circuit, and every failure mode (timeout, non-200,
//! malformed body) yields `None` with a server-side warning.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::enrich::ip::is_private_ip;

pub struct CountryResolver {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CountryBody {
    country: Option<String>,
}

impl CountryResolver {
    /// The timeout bounds the whole request; without it a slow third party
    /// would tie up ingestion request handlers.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a country name for a client address, if any.
    pub async fn lookup(&self, ip: Option<&str>) -> Option<String> {
        let ip = ip?;
        if is_private_ip(ip) {
            return None;
        }

        match self.fetch(ip).await {
            Ok(country) => country,
            Err(e) => {
                warn!("country lookup failed for {}: {}", ip, e);
                None
            }
        }
    }

    async fn fetch(&self, ip: &str) -> Result<Option<String>> {
        let url = format!("{}/json/{}?fields=country", self.base_url, ip);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let body: CountryBody = response.json().await?;
        Ok(body.country.filter(|c| !c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CountryResolver {
        // Unroutable port; any accidental network attempt fails fast.
        CountryResolver::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn absent_address_short_circuits() {
        assert_eq!(resolver().lookup(None).await, None);
    }

    #[tokio::test]
    async fn private_addresses_never_trigger_a_lookup() {
        let resolver = resolver();
        for ip in ["127.0.0.1", "::1", "192.168.1.10", "10.0.0.1", "172.20.0.3"] {
            assert_eq!(resolver.lookup(Some(ip)).await, None);
        }
    }

    #[tokio::test]
    async fn unreachable_service_yields_none() {
        assert_eq!(resolver().lookup(Some("203.0.113.1")).await, None);
    }
}
