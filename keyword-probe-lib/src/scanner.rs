//! Pipeline driver.
//!
//! This module provides the `KeywordScanner` that fans targets out to
//! concurrent workers behind the admission controller, classifies what comes
//! back and collects the verdicts.

use crate::aggregator::ResultAggregator;
use crate::concurrent::AdmissionController;
use crate::error::ScanError;
use crate::fetcher::HttpFetcher;
use crate::matcher::KeywordVocabulary;
use crate::types::{
    FetchFailure, FetchOutcome, HostTarget, ResultSet, ScanConfig, ScanReport, Verdict,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs fetch → classify → record for a list of hosts.
///
/// Every host gets its own task; at most `concurrency` of them hold an
/// admission slot at once. A failing host never affects the others.
///
/// # Example
///
/// ```rust,no_run
/// use keyword_probe_lib::{HostTarget, KeywordScanner, ScanConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScanConfig::default()
///         .with_concurrency(20)
///         .with_timeout(Duration::from_secs(3));
///     let scanner = KeywordScanner::with_config(config)?;
///
///     let targets = vec![HostTarget::new("https://example.com")?];
///     let report = scanner.run_report(&targets).await;
///     println!("{} verdicts, {} failures", report.results.len(), report.failures.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct KeywordScanner {
    /// Configuration settings for this scanner instance
    config: ScanConfig,
    /// HTTP client shared by all workers
    fetcher: HttpFetcher,
    /// Read-only keyword list shared by all workers
    vocabulary: Arc<KeywordVocabulary>,
    /// Slot gate shared by all workers
    admission: AdmissionController,
}

impl KeywordScanner {
    /// Create a scanner with default configuration (50 slots, 5 s timeout,
    /// built-in vocabulary).
    pub fn new() -> Result<Self, ScanError> {
        Self::with_config(ScanConfig::default())
    }

    /// Create a scanner with custom configuration.
    ///
    /// Fails if the HTTP client cannot be built or the configured keyword
    /// list is unusable.
    pub fn with_config(config: ScanConfig) -> Result<Self, ScanError> {
        let vocabulary = match &config.keywords {
            Some(keywords) => Arc::new(KeywordVocabulary::new(keywords.iter().cloned())?),
            None => KeywordVocabulary::builtin(),
        };
        let fetcher = HttpFetcher::with_config(&config)?;
        let admission = AdmissionController::new(config.concurrency);

        Ok(Self {
            config,
            fetcher,
            vocabulary,
            admission,
        })
    }

    /// Fetch and classify a single host, holding one admission slot for the
    /// whole sequence.
    ///
    /// Returns the failure reason when the fetch did not complete; nothing
    /// is recorded in that case.
    pub async fn scan_host(&self, target: &HostTarget) -> Result<Verdict, ScanError> {
        let _permit = self.admission.acquire().await;
        debug!(url = target.url(), in_flight = self.admission.in_flight(), "admitted");

        match self.fetcher.fetch(target).await {
            FetchOutcome::Fetched { body } => {
                let classification = self.vocabulary.classify(&body);
                let verdict = Verdict::new(target.url(), classification.keywords);
                info!(
                    url = %verdict.url,
                    matched = verdict.matched,
                    keywords = ?verdict.keywords,
                    "fetched"
                );
                Ok(verdict)
            }
            FetchOutcome::Failed { reason } => {
                warn!(url = target.url(), error = %reason, "fetch failed");
                Err(reason)
            }
        }
    }

    /// Scan every target and return the completed result set.
    ///
    /// Returns only once every task has finished. Hosts whose fetch failed
    /// are absent from the result.
    pub async fn run(&self, targets: &[HostTarget]) -> ResultSet {
        self.run_report(targets).await.results
    }

    /// Like [`run`](Self::run), but also reports failures and timing.
    pub async fn run_report(&self, targets: &[HostTarget]) -> ScanReport {
        let start_time = Instant::now();
        let aggregator = ResultAggregator::with_capacity(targets.len());
        let failures: Arc<Mutex<Vec<FetchFailure>>> = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let scanner = self.clone();
                let aggregator = aggregator.clone();
                let failures = Arc::clone(&failures);
                tokio::spawn(async move {
                    match scanner.scan_host(&target).await {
                        Ok(verdict) => aggregator.record(verdict),
                        Err(reason) => failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(FetchFailure {
                                url: target.url().to_string(),
                                reason,
                            }),
                    }
                })
            })
            .collect();

        // Barrier: nothing is returned until every task has ended.
        let joined = futures_util::future::join_all(handles).await;

        let mut panicked = Vec::new();
        for (target, outcome) in targets.iter().zip(joined) {
            if let Err(join_error) = outcome {
                error!(url = target.url(), error = %join_error, "worker task aborted");
                panicked.push(FetchFailure {
                    url: target.url().to_string(),
                    reason: ScanError::internal(format!("worker task aborted: {}", join_error)),
                });
            }
        }

        let mut failures = match Arc::try_unwrap(failures) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                let guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                guard.clone()
            }
        };
        failures.extend(panicked);

        let results = aggregator.into_result_set();
        let duration = start_time.elapsed();
        info!(
            attempted = targets.len(),
            verdicts = results.len(),
            matched = results.matched_count(),
            failed = failures.len(),
            elapsed_ms = duration.as_millis() as u64,
            "scan finished"
        );

        ScanReport {
            results,
            failures,
            attempted: targets.len(),
            duration,
        }
    }

    /// Get the current configuration for this scanner.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The vocabulary used for classification.
    pub fn vocabulary(&self) -> &KeywordVocabulary {
        &self.vocabulary
    }

    /// The admission controller, for inspecting in-flight counts.
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }
}
