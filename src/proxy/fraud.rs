//! Fraud score lookup module backed by the ip2location.io fraud endpoint
//!
//! Lookups go out directly, never through a proxy, and are memoized per IP
//! for the lifetime of the client so a run hits the API at most once per
//! distinct exit IP.

use crate::Result;
use anyhow::{bail, Context};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default fraud API endpoint
const DEFAULT_API_URL: &str = "https://api.ip2location.io/";

/// Default timeout for fraud lookups in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the fraud score client
#[derive(Debug, Clone)]
pub struct FraudConfig {
    /// Fraud API endpoint
    pub api_url: String,
    /// API key, must have the fraud add-on enabled
    pub api_key: String,
    /// Timeout for each lookup
    pub timeout: Duration,
}

impl FraudConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fraud score client with a per-run score cache
pub struct FraudClient {
    config: FraudConfig,
    client: Client,
    cache: HashMap<String, u32>,
}

impl FraudClient {
    /// Create a new fraud client with the given configuration
    pub fn with_config(config: FraudConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            client,
            cache: HashMap::new(),
        })
    }

    /// Get the fraud score for an IP, consulting the cache first.
    ///
    /// Only successful lookups are cached, so a failed lookup for an IP is
    /// retried when a later proxy resolves to the same address.
    pub async fn score(&mut self, ip: &str) -> Result<u32> {
        if let Some(&score) = self.cache.get(ip) {
            debug!(ip, score, "fraud score cache hit");
            return Ok(score);
        }

        let score = self.fetch(ip).await?;
        self.cache.insert(ip.to_string(), score);
        Ok(score)
    }

    /// Query the fraud API for an IP
    async fn fetch(&self, ip: &str) -> Result<u32> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("ip", ip),
                ("format", "json"),
                ("source", "fraud"),
            ])
            .send()
            .await
            .with_context(|| format!("fraud API request failed for {}", ip))?
            .error_for_status()?;

        let body: Value = response
            .json()
            .await
            .context("fraud API returned a non-JSON body")?;

        parse_fraud_score(&body)
    }
}

/// Extract the `fraud_score` field from a fraud API response body.
///
/// The field is absent when the API key does not have the fraud add-on
/// enabled, in which case the full response is included in the error.
fn parse_fraud_score(body: &Value) -> Result<u32> {
    let Some(value) = body.get("fraud_score") else {
        bail!("fraud API not enabled or bad response: {}", body);
    };

    value
        .as_u64()
        .and_then(|score| u32::try_from(score).ok())
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .with_context(|| format!("fraud API returned a non-integer fraud_score: {}", value))
}
