//! Proxy checker module for vetting proxies by exit IP fraud score

use crate::proxy::fraud::FraudClient;
use crate::proxy::models::{Proxy, ProxyCheckResult};
use crate::proxy::parser::ProxyParser;
use crate::Result;
use anyhow::Context;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Default timeout for network calls in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default URL returning the caller's public IP as plain text
const DEFAULT_ECHO_URL: &str = "https://api.ipify.org";

/// A proxy is clean only when its exit IP scores exactly zero
const CLEAN_FRAUD_SCORE: u32 = 0;

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each network call
    pub timeout: Duration,
    /// IP echo endpoint queried through each proxy
    pub echo_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            echo_url: DEFAULT_ECHO_URL.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_echo_url(mut self, url: String) -> Self {
        self.echo_url = url;
        self
    }
}

/// Proxy checker for vetting proxies one record at a time
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self {
            config: CheckerConfig::default(),
        }
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    /// Vet a single raw record: parse, resolve the exit IP through the
    /// proxy, score the IP, classify. Every failure along the way ends up
    /// as a `Failed` status on the result instead of aborting the batch.
    pub async fn vet(&self, record: &str, fraud: &mut FraudClient) -> ProxyCheckResult {
        match self.resolve_and_score(record, fraud).await {
            Ok((ip, score)) if score == CLEAN_FRAUD_SCORE => {
                ProxyCheckResult::clean(record.to_string(), ip, score)
            }
            Ok((ip, score)) => ProxyCheckResult::flagged(record.to_string(), ip, score),
            Err(e) => ProxyCheckResult::failed(record.to_string(), format!("{:#}", e)),
        }
    }

    async fn resolve_and_score(
        &self,
        record: &str,
        fraud: &mut FraudClient,
    ) -> Result<(String, u32)> {
        let proxy = ProxyParser::parse_record(record)?;
        let ip = self.resolve_ip(&proxy).await?;
        let score = fraud.score(&ip).await?;
        Ok((ip, score))
    }

    /// Resolve the public IP a proxy egresses from by querying the echo
    /// endpoint through it
    pub async fn resolve_ip(&self, proxy: &Proxy) -> Result<String> {
        let client = self.create_client(proxy)?;

        let body = client
            .get(&self.config.echo_url)
            .send()
            .await
            .with_context(|| format!("request through {} failed", proxy))?
            .error_for_status()?
            .text()
            .await?;

        let ip: IpAddr = body
            .trim()
            .parse()
            .with_context(|| format!("echo service returned a non-IP body: {:?}", body.trim()))?;

        debug!(proxy = %proxy.host, %ip, "resolved exit IP");
        Ok(ip.to_string())
    }

    /// Create a reqwest client tunneled through the proxy
    fn create_client(&self, proxy: &Proxy) -> Result<Client> {
        let reqwest_proxy = ReqwestProxy::all(proxy.url())?;

        let client = Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.config.timeout)
            .build()?;

        Ok(client)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::fraud::FraudConfig;

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.echo_url, DEFAULT_ECHO_URL);
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_echo_url("http://example.com".to_string());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.echo_url, "http://example.com");
    }

    #[test]
    fn test_create_client() {
        let checker = ProxyChecker::new();
        let proxy = Proxy::new(
            "127.0.0.1".to_string(),
            1080,
            "user".to_string(),
            "pass".to_string(),
        );
        assert!(checker.create_client(&proxy).is_ok());
    }

    #[tokio::test]
    async fn test_vet_malformed_record_fails_before_network() {
        let checker = ProxyChecker::new();
        let mut fraud = FraudClient::with_config(FraudConfig::new("key".to_string())).unwrap();

        let result = checker.vet("not-a-proxy", &mut fraud).await;
        assert!(!result.is_clean());
        assert_eq!(result.proxy, "not-a-proxy");
        assert!(format!("{}", result).contains("FAILED: invalid proxy format"));
    }
}
