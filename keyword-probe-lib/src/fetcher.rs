//! HTTP fetching of a single host.
//!
//! One GET per host, bounded by the configured timeout, no retries. Any
//! status code counts as a response; only transport problems are failures.

use crate::error::ScanError;
use crate::types::{FetchOutcome, HostTarget, ScanConfig};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper that turns a target into a [`FetchOutcome`].
#[derive(Clone)]
pub struct HttpFetcher {
    /// Shared connection pool for all workers
    http_client: reqwest::Client,
    /// Deadline for connect, TLS and the full body read
    timeout: Duration,
    /// Body bytes kept per host; `None` keeps everything
    max_body_bytes: Option<usize>,
}

impl HttpFetcher {
    /// Create a fetcher with default settings (5 second timeout, 10 MiB cap).
    pub fn new() -> Result<Self, ScanError> {
        Self::with_config(&ScanConfig::default())
    }

    /// Create a fetcher from a scan configuration.
    pub fn with_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ScanError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Fetch one target.
    ///
    /// Never returns an error: every failure is folded into
    /// [`FetchOutcome::Failed`] so the caller can keep going.
    pub async fn fetch(&self, target: &HostTarget) -> FetchOutcome {
        let url = target.url();

        // The client enforces the deadline too; this also covers time spent
        // between body chunks.
        match tokio::time::timeout(self.timeout, self.read_body(url)).await {
            Ok(Ok(body)) => FetchOutcome::Fetched { body },
            Ok(Err(reason)) => FetchOutcome::Failed { reason },
            Err(_) => FetchOutcome::Failed {
                reason: ScanError::timeout(format!("GET {}", url), self.timeout),
            },
        }
    }

    async fn read_body(&self, url: &str) -> Result<Vec<u8>, ScanError> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ScanError::from_fetch(url, e, self.timeout))?;

        debug!(url, status = %response.status(), "response received");

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ScanError::from_fetch(url, e, self.timeout))?
        {
            match self.max_body_bytes {
                Some(max) if body.len() + chunk.len() > max => {
                    let remaining = max - body.len();
                    body.extend_from_slice(&chunk[..remaining]);
                    debug!(url, max_body_bytes = max, "body truncated at cap");
                    break;
                }
                _ => body.extend_from_slice(&chunk),
            }
        }

        Ok(body)
    }

    /// The per-fetch deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The body cap, if any.
    pub fn max_body_bytes(&self) -> Option<usize> {
        self.max_body_bytes
    }
}
