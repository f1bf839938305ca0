//! Console output for keyword-probe.
//!
//! Plain rows, the `--pretty` grouped view, the spinner shown while hosts
//! are being fetched, and the end-of-run summaries. Everything decorative
//! goes through the `console` crate.

use console::{pad_str, style, Alignment, Term};
use keyword_probe_lib::{
    format_verdict_row, AdmissionController, FetchFailure, KeywordVocabulary, ResultSet,
    ScanConfig, ScanReport, Verdict,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::FailureStats;

const URL_WIDTH: usize = 36;
const MAX_LISTED: usize = 5;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Progress line on stderr while a scan runs, redrawn from the admission
/// counters: hosts finished, hosts in flight, total.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start reporting progress for `total` hosts. Returns `None` when stderr
    /// is not a terminal.
    pub fn start(total: usize, admission: AdmissionController) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            for frame in SPINNER_FRAMES.iter().cycle() {
                if !running_clone.load(Ordering::Relaxed) {
                    break;
                }
                let in_flight = admission.in_flight();
                let done = admission.admitted().saturating_sub(in_flight);
                let _ = term.clear_line();
                let _ = term.write_str(&format!(
                    "{} {}",
                    style(frame).cyan(),
                    progress_line(done, total, in_flight)
                ));
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop redrawing and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

fn progress_line(done: usize, total: usize, in_flight: usize) -> String {
    format!(
        "Fetched {}/{} hosts, {} in flight",
        done.min(total),
        total,
        in_flight
    )
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(host_count: usize, config: &ScanConfig, input: &str) {
    println!(
        "{} {} {}",
        style("keyword-probe").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!("· Probing {} from {}", plural(host_count, "host"), input)).dim(),
    );

    let mut meta_parts = vec![
        format!("Concurrency: {}", config.concurrency),
        format!("Timeout: {}", format_duration(config.timeout)),
    ];
    if let Some(keywords) = &config.keywords {
        meta_parts.push(format!("Keywords: {}", keywords.len()));
    }

    println!("{}", style(meta_parts.join(" | ")).dim());
    println!();
}

// ── Plain output ─────────────────────────────────────────────────────────────

/// Print one verdict in the same shape as its result-file row.
pub fn print_verdict_default(verdict: &Verdict) {
    println!("{}", format_verdict_row(verdict));
}

/// Print the active vocabulary, one keyword per line, whitespace made visible.
pub fn print_keywords(vocabulary: &KeywordVocabulary) {
    for keyword in vocabulary.keywords() {
        println!("{}", visible_keyword(keyword));
    }
}

// ── Grouped output ───────────────────────────────────────────────────────────

/// Print verdicts grouped as Matched then Unmatched. Empty sections are omitted.
pub fn print_grouped_results(results: &ResultSet) {
    let (matched, unmatched): (Vec<&Verdict>, Vec<&Verdict>) =
        results.iter().partition(|v| v.matched);

    if !matched.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Matched ({}) ", matched.len())).green().bold(),
            style("─".repeat(40)).green().dim(),
        );
        for verdict in &matched {
            println!(
                "    {}  {}",
                style(pad_url(&verdict.url)).white(),
                style(verdict.keywords.join(", ")).cyan(),
            );
        }
        println!();
    }

    if !unmatched.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Unmatched ({}) ", unmatched.len())).dim().bold(),
            style("─".repeat(38)).dim(),
        );
        for verdict in &unmatched {
            println!("    {}", style(pad_url(&verdict.url)).white());
        }
        println!();
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(report: &ScanReport, output: &str) {
    let matched = report.results.matched_count();
    let unmatched = report.results.len() - matched;

    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(plural(report.attempted, "host")).bold(),
        report.duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} matched", matched)).green(),
        style("|").dim(),
        format!("{} unmatched", unmatched),
        style("|").dim(),
        style(format!("{} failed", report.failures.len())).yellow(),
    );
    println!(
        "  {} {}",
        style("Results written to").dim(),
        style(output).bold()
    );
}

// ── Failure summary ──────────────────────────────────────────────────────────

/// Print failed hosts grouped by cause. With `debug` each reason is listed too.
pub fn print_failure_summary(stats: &FailureStats, failures: &[FetchFailure], debug: bool) {
    if !stats.has_failures() {
        return;
    }

    println!(
        "  {}",
        style("Some hosts could not be fetched and are not in the results:").yellow()
    );

    let groups: [(&[String], &str); 3] = [
        (&stats.timeouts, "timeout"),
        (&stats.network_errors, "network error"),
        (&stats.other_errors, "other error"),
    ];
    for (urls, label) in groups {
        if !urls.is_empty() {
            println!(
                "  {} {}: {}",
                style("•").dim(),
                plural(urls.len(), label),
                format_list(urls, MAX_LISTED),
            );
        }
    }

    if debug {
        for failure in failures {
            println!(
                "    {} {}  {}",
                style("└─").dim(),
                failure.url,
                style(&failure.reason).dim(),
            );
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn pad_url(url: &str) -> String {
    pad_str(url, URL_WIDTH, Alignment::Left, Some("..")).into_owned()
}

/// Join the first `max_show` items and note how many were left out.
fn format_list(items: &[String], max_show: usize) -> String {
    if items.len() <= max_show {
        items.join(", ")
    } else {
        format!(
            "{}, ... and {} more",
            items[..max_show].join(", "),
            items.len() - max_show
        )
    }
}

fn plural(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Quote a keyword and escape newlines so leading/trailing whitespace shows.
fn visible_keyword(keyword: &str) -> String {
    format!("\"{}\"", keyword.replace('\n', "\\n"))
}

// ── Tests ────────────────────────────────────────────────────────────────────
