//! Core data types for fetching and classifying hosts.
//!
//! This module defines the input targets, per-host outcomes, verdicts,
//! the result set handed to the exporter, and the scan configuration.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single host to fetch, as a scheme-qualified URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostTarget {
    url: String,
}

impl HostTarget {
    /// Create a target from an already scheme-qualified URL.
    pub fn new<U: Into<String>>(url: U) -> Result<Self, ScanError> {
        let url = url.into();
        let trimmed = url.trim();
        let rest = strip_scheme(trimmed).ok_or_else(|| {
            ScanError::invalid_target(trimmed, "URL must start with http:// or https://")
        })?;
        if rest.is_empty() {
            return Err(ScanError::invalid_target(trimmed, "URL has no host"));
        }
        Ok(Self {
            url: trimmed.to_string(),
        })
    }

    /// Build a target from one line of the input list.
    ///
    /// Lines without a scheme get `https://` prepended. Blank lines and
    /// `#` comments yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        if strip_scheme(trimmed).is_some() {
            return Self::new(trimmed).ok();
        }
        Some(Self {
            url: format!("https://{}", trimmed),
        })
    }

    /// The URL that will be fetched.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// The part after `http://` or `https://`, scheme matched in any case.
fn strip_scheme(url: &str) -> Option<&str> {
    ["https://", "http://"].iter().find_map(|scheme| {
        url.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &url[scheme.len()..])
    })
}

impl std::fmt::Display for HostTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Result of one fetch attempt. Never leaves the worker that produced it.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The request failed; no verdict will be produced
    Failed { reason: ScanError },

    /// A response arrived and its body (possibly capped) was read
    Fetched { body: Vec<u8> },
}

/// Classification of one successfully fetched host.
///
/// `keywords` is non-empty if and only if `matched` is true.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// The URL that was fetched
    pub url: String,

    /// Whether any vocabulary keyword was found
    pub matched: bool,

    /// Matched keywords in vocabulary order
    pub keywords: Vec<String>,
}

impl Verdict {
    /// Build a verdict, deriving `matched` from the keyword list.
    pub fn new<U: Into<String>>(url: U, keywords: Vec<String>) -> Self {
        Self {
            url: url.into(),
            matched: !keywords.is_empty(),
            keywords,
        }
    }
}

/// All verdicts produced by a run. Order follows completion, not input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    verdicts: Vec<Verdict>,
}

impl ResultSet {
    pub fn new(verdicts: Vec<Verdict>) -> Self {
        Self { verdicts }
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Verdict> {
        self.verdicts.iter()
    }

    /// Number of verdicts with at least one keyword.
    pub fn matched_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.matched).count()
    }

    /// Find the verdict for a URL, if that host completed.
    pub fn get(&self, url: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.url == url)
    }

    /// Sort verdicts by URL for stable display.
    pub fn sort_by_url(&mut self) {
        self.verdicts.sort_by(|a, b| a.url.cmp(&b.url));
    }

    pub fn into_vec(self) -> Vec<Verdict> {
        self.verdicts
    }
}

impl IntoIterator for ResultSet {
    type Item = Verdict;
    type IntoIter = std::vec::IntoIter<Verdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.verdicts.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Verdict;
    type IntoIter = std::slice::Iter<'a, Verdict>;

    fn into_iter(self) -> Self::IntoIter {
        self.verdicts.iter()
    }
}

/// A host whose fetch failed, kept for the run summary only.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub url: String,
    pub reason: ScanError,
}

/// Everything a run produced: the verdicts plus what went wrong.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Verdicts of all hosts that completed a fetch
    pub results: ResultSet,

    /// Hosts that produced no verdict, with the reason
    pub failures: Vec<FetchFailure>,

    /// Number of targets handed to the run
    pub attempted: usize,

    /// Wall-clock duration of the whole run
    pub duration: Duration,
}

/// Configuration options for a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of fetches in flight at once
    /// Default: 50, Range: 1-500
    pub concurrency: usize,

    /// Bound on one fetch: connect, TLS handshake and full body read
    /// Default: 5 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,

    /// Maximum body bytes read per host. `None` reads everything.
    /// Default: 10 MiB
    pub max_body_bytes: Option<usize>,

    /// Override for the built-in keyword vocabulary
    /// Default: None (built-in list)
    pub keywords: Option<Vec<String>>,

    /// User-Agent header sent with each request
    pub user_agent: String,
}

/// Upper bound accepted for `concurrency`.
pub const MAX_CONCURRENCY: usize = 500;

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 50,
            timeout: Duration::from_secs(5),
            max_body_bytes: Some(10 * 1024 * 1024),
            keywords: None,
            user_agent: format!("keyword-probe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ScanConfig {
    /// Set the admission capacity, clamped to 1..=500.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap body reads. `0` disables the cap.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = if max == 0 { None } else { Some(max) };
        self
    }

    /// Replace the keyword vocabulary.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_line_prefixes_https() {
        let target = HostTarget::from_line("  example.com \n").unwrap();
        assert_eq!(target.url(), "https://example.com");

        let target = HostTarget::from_line("example.com/pricing").unwrap();
        assert_eq!(target.url(), "https://example.com/pricing");
    }

    #[test]
    fn test_target_from_line_keeps_scheme() {
        let target = HostTarget::from_line("http://localhost:8080/a").unwrap();
        assert_eq!(target.url(), "http://localhost:8080/a");
    }

    #[test]
    fn test_target_from_line_scheme_is_case_insensitive() {
        let target = HostTarget::from_line("HTTPS://Example.com").unwrap();
        assert_eq!(target.url(), "HTTPS://Example.com");

        let target = HostTarget::from_line("Http://localhost:8080").unwrap();
        assert_eq!(target.url(), "Http://localhost:8080");

        assert!(HostTarget::new("HTTPS://").is_err());
    }

    #[test]
    fn test_target_from_line_skips_blank_and_comments() {
        assert!(HostTarget::from_line("").is_none());
        assert!(HostTarget::from_line("   ").is_none());
        assert!(HostTarget::from_line("# saas vendors").is_none());
    }

    #[test]
    fn test_target_new_requires_scheme() {
        assert!(HostTarget::new("example.com").is_err());
        assert!(HostTarget::new("https://").is_err());
        assert!(HostTarget::new("https://example.com").is_ok());
    }

    #[test]
    fn test_verdict_invariant() {
        let v = Verdict::new("https://a.com", vec![]);
        assert!(!v.matched);

        let v = Verdict::new("https://b.com", vec!["big data".to_string()]);
        assert!(v.matched);
        assert_eq!(v.keywords, vec!["big data"]);
    }

    #[test]
    fn test_config_builders() {
        let config = ScanConfig::default()
            .with_concurrency(0)
            .with_timeout(Duration::from_millis(250))
            .with_max_body_bytes(0);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.max_body_bytes, None);

        let config = ScanConfig::default().with_concurrency(10_000);
        assert_eq!(config.concurrency, MAX_CONCURRENCY);
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, 50);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.user_agent.starts_with("keyword-probe/"));
    }

    #[test]
    fn test_result_set_helpers() {
        let mut set = ResultSet::new(vec![
            Verdict::new("https://z.com", vec!["nlp".to_string()]),
            Verdict::new("https://a.com", vec![]),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.matched_count(), 1);
        assert!(set.get("https://a.com").is_some());
        assert!(set.get("https://missing.com").is_none());

        set.sort_by_url();
        let urls: Vec<&str> = set.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://z.com"]);
    }

    #[test]
    fn test_result_set_serializes_as_plain_array() {
        let set = ResultSet::new(vec![Verdict::new(
            "https://example.com",
            vec!["big data".to_string()],
        )]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"url": "https://example.com", "matched": true, "keywords": ["big data"]}
            ])
        );
    }
}
