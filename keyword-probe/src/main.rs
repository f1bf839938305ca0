//! Keyword Probe CLI Application
//!
//! Reads a host list, fetches every host with bounded concurrency, flags the
//! ones whose page mentions a vocabulary keyword, and writes one row per
//! fetched host to a delimited text file.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use keyword_probe_lib::{
    load_env_config, load_targets_from_file, parse_timeout_string, write_results_csv,
    ConfigManager, FetchFailure, FileConfig, KeywordScanner, ScanConfig, ScanError,
    DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for keyword-probe
#[derive(Parser, Debug)]
#[command(name = "keyword-probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch hosts concurrently and flag pages that mention your keywords")]
#[command(
    long_about = "Fetch every host of a line-delimited list over HTTPS with bounded concurrency,\nsearch each page for a keyword vocabulary and write url,matched,keywords rows.\n\nRun without arguments to read SaaS.txt and write checkedURLs.csv."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Host list, one hostname or path per line (default: SaaS.txt)
    #[arg(short = 'f', long = "input", value_name = "FILE", help_heading = "Files")]
    pub input: Option<String>,

    /// Result file (default: checkedURLs.csv)
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Files")]
    pub output: Option<String>,

    /// Max concurrent fetches (default: 50, max: 500)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Per-host timeout, e.g. 5s, 500ms, 1m (default: 5s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Max body bytes read per host, 0 for unlimited (default: 10485760)
    #[arg(long = "max-body-bytes", value_name = "BYTES", help_heading = "Performance")]
    pub max_body_bytes: Option<usize>,

    /// Replace the keyword vocabulary (comma-separated or multiple -k flags).
    /// Entries are trimmed; keywords with significant spaces such as " ai "
    /// must go in the [vocabulary] section of a config file
    #[arg(short = 'k', long = "keywords", value_name = "KEYWORD", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Classification")]
    pub keywords: Option<Vec<String>>,

    /// Print the active keyword vocabulary and exit
    #[arg(long = "list-keywords", help_heading = "Classification")]
    pub list_keywords: bool,

    /// Also print the result set as JSON on stdout
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Styled results table and summary
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logs and failure reasons
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
struct RunSettings {
    config: ScanConfig,
    input: String,
    output: String,
}

/// Failed hosts grouped by cause, for the end-of-run summary.
#[derive(Debug, Default)]
pub struct FailureStats {
    pub timeouts: Vec<String>,
    pub network_errors: Vec<String>,
    pub other_errors: Vec<String>,
}

impl FailureStats {
    fn from_failures(failures: &[FetchFailure]) -> Self {
        let mut stats = Self::default();
        for failure in failures {
            stats.add_failure(&failure.url, &failure.reason);
        }
        stats
    }

    fn add_failure(&mut self, url: &str, reason: &ScanError) {
        if reason.is_timeout() {
            self.timeouts.push(url.to_string());
        } else if reason.is_network() {
            self.network_errors.push(url.to_string());
        } else {
            self.other_errors.push(url.to_string());
        }
    }

    pub fn total(&self) -> usize {
        self.timeouts.len() + self.network_errors.len() + self.other_errors.len()
    }

    pub fn has_failures(&self) -> bool {
        self.total() > 0
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);

    if let Err(e) = run_probe(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "debug"
    } else if args.pretty || args.json {
        "warn"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 500 {
            return Err("Concurrency must be between 1 and 500".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '500ms', '5s', '2m'",
                timeout
            ));
        }
    }

    if let Some(keywords) = &args.keywords {
        if keywords.iter().all(|k| k.trim().is_empty()) {
            return Err("--keywords needs at least one non-empty keyword".to_string());
        }
    }

    Ok(())
}

/// Main probing logic
async fn run_probe(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;
    debug!(
        input = %settings.input,
        output = %settings.output,
        concurrency = settings.config.concurrency,
        timeout_ms = settings.config.timeout.as_millis() as u64,
        max_body_bytes = ?settings.config.max_body_bytes,
        "resolved settings"
    );
    let scanner = KeywordScanner::with_config(settings.config.clone())?;

    if args.list_keywords {
        ui::print_keywords(scanner.vocabulary());
        return Ok(());
    }

    // Missing input, an output that would overwrite the input, or an
    // unwritable output stop the run before any fetch.
    let targets = load_targets_from_file(&settings.input)?;
    ensure_distinct_paths(&settings.input, &settings.output)?;
    ensure_output_writable(&settings.output)?;

    if args.verbose {
        eprintln!(
            "🔍 Probing {} hosts from {} (concurrency {}, timeout {:?})",
            targets.len(),
            settings.input,
            settings.config.concurrency,
            settings.config.timeout
        );
    }

    if args.pretty {
        ui::print_header(targets.len(), &settings.config, &settings.input);
    }

    let spinner = if args.pretty {
        ui::Spinner::start(targets.len(), scanner.admission().clone())
    } else {
        None
    };

    let mut report = scanner.run_report(&targets).await;

    if let Some(s) = spinner {
        s.stop().await;
    }

    write_results_csv(&settings.output, &report.results)?;

    let stats = FailureStats::from_failures(&report.failures);
    report.results.sort_by_url();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.results)?);
    } else if args.pretty {
        ui::print_grouped_results(&report.results);
        ui::print_summary(&report, &settings.output);
        if stats.has_failures() {
            println!();
            ui::print_failure_summary(&stats, &report.failures, args.debug);
        }
    } else {
        for verdict in &report.results {
            ui::print_verdict_default(verdict);
        }
        println!(
            "All URLs have been fetched. {} rows written to {}",
            report.results.len(),
            settings.output
        );
    }

    Ok(())
}

/// Refuse an output path that resolves to the input file.
fn ensure_distinct_paths(input: &str, output: &str) -> Result<(), ScanError> {
    if resolve_file(input) == resolve_file(output) {
        return Err(ScanError::config(format!(
            "Input and output must be different files (both resolve to '{}')",
            input
        )));
    }
    Ok(())
}

/// Absolute form of `path`. A file that does not exist yet is resolved
/// through its parent directory.
fn resolve_file(path: &str) -> PathBuf {
    let path = Path::new(path);
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Check that the output file can be opened for writing without truncating it.
fn ensure_output_writable(output: &str) -> Result<(), ScanError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(output))
        .map(|_| ())
        .map_err(|e| {
            ScanError::file_error(output, format!("Cannot create output file: {}", e))
        })
}

/// Build run settings with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (KP_*)
/// 3. Explicit config file (--config / KP_CONFIG) or discovered config files
/// 4. Built-in defaults
fn build_settings(args: &Args) -> Result<RunSettings, Box<dyn std::error::Error>> {
    let env_config = load_env_config(args.verbose);
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Config files
    let file_config = if let Some(explicit_config_path) = &args.config {
        if args.verbose {
            eprintln!(
                "🔧 Using explicit config file (CLI --config): {}",
                explicit_config_path
            );
        }
        config_manager
            .load_file(explicit_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", explicit_config_path, e))?
    } else if let Some(env_config_path) = &env_config.config {
        if args.verbose {
            eprintln!(
                "🔧 Using explicit config file (KP_CONFIG env var): {}",
                env_config_path
            );
        }
        config_manager
            .load_file(env_config_path)
            .map_err(|e| format!("Failed to load config file '{}': {}", env_config_path, e))?
    } else {
        if args.verbose {
            eprintln!("🔧 Discovering config files...");
        }
        config_manager.discover_and_load()?
    };

    let mut config = file_config.apply_to(ScanConfig::default());

    // Step 2: Environment variables
    config = env_config.apply_to(config);

    // Step 3: CLI arguments
    config = apply_cli_args_to_config(config, args);

    let input = resolve_path(
        args.input.as_deref(),
        env_config.input.as_deref(),
        &file_config,
        FileConfig::input,
        DEFAULT_INPUT_FILE,
    );
    let output = resolve_path(
        args.output.as_deref(),
        env_config.output.as_deref(),
        &file_config,
        FileConfig::output,
        DEFAULT_OUTPUT_FILE,
    );

    Ok(RunSettings {
        config,
        input,
        output,
    })
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier layers.
fn apply_cli_args_to_config(mut config: ScanConfig, args: &Args) -> ScanConfig {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config.timeout = timeout;
    }
    if let Some(max) = args.max_body_bytes {
        config = config.with_max_body_bytes(max);
    }
    if let Some(keywords) = &args.keywords {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        config.keywords = Some(keywords);
    }
    config
}

/// CLI > env > config file > built-in default.
fn resolve_path(
    cli: Option<&str>,
    env: Option<&str>,
    file_config: &FileConfig,
    from_file: fn(&FileConfig) -> Option<&str>,
    default: &str,
) -> String {
    cli.or(env)
        .or_else(|| from_file(file_config))
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyword_probe_lib::DefaultsConfig;
    use std::fs;
    use std::time::Duration;

    fn create_test_args() -> Args {
        Args {
            input: None,
            output: None,
            concurrency: None,
            timeout: None,
            max_body_bytes: None,
            keywords: None,
            list_keywords: false,
            json: false,
            pretty: false,
            config: None,
            debug: false,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_args_defaults_ok() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_concurrency_bounds() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());

        args.concurrency = Some(501);
        assert!(validate_args(&args)
            .unwrap_err()
            .contains("Concurrency must be between 1 and 500"));

        args.concurrency = Some(500);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_bad_timeout() {
        let mut args = create_test_args();
        args.timeout = Some("forever".to_string());
        assert!(validate_args(&args).unwrap_err().contains("Invalid timeout"));
    }

    #[test]
    fn test_distinct_paths_catches_other_spellings() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let input = dir.path().join("SaaS.txt");
        fs::write(&input, "example.com\n").unwrap();

        let input_str = input.to_str().unwrap();
        let dotted = dir.path().join("sub").join("..").join("SaaS.txt");
        let dotted_str = dotted.to_str().unwrap();

        assert!(ensure_distinct_paths(input_str, input_str).is_err());
        assert!(ensure_distinct_paths(input_str, dotted_str).is_err());

        let output = dir.path().join("checkedURLs.csv");
        assert!(ensure_distinct_paths(input_str, output.to_str().unwrap()).is_ok());
        assert_eq!(fs::read_to_string(&input).unwrap(), "example.com\n");
    }

    #[test]
    fn test_resolve_file_for_missing_file_uses_parent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("new.csv");
        let resolved = resolve_file(missing.to_str().unwrap());
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("new.csv"));
    }

    #[test]
    fn test_validate_args_blank_keywords() {
        let mut args = create_test_args();
        args.keywords = Some(vec![" ".to_string(), String::new()]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_cli_args_only_override_when_given() {
        let args = create_test_args();
        let config = ScanConfig::default().with_concurrency(12);

        let result = apply_cli_args_to_config(config, &args);
        assert_eq!(result.concurrency, 12);
        assert_eq!(result.timeout, Duration::from_secs(5));
        assert!(result.keywords.is_none());
    }

    #[test]
    fn test_cli_args_override_config() {
        let mut args = create_test_args();
        args.concurrency = Some(3);
        args.timeout = Some("750ms".to_string());
        args.max_body_bytes = Some(0);
        args.keywords = Some(vec![" rust ".to_string(), "".to_string(), "tokio".to_string()]);

        let result = apply_cli_args_to_config(ScanConfig::default(), &args);
        assert_eq!(result.concurrency, 3);
        assert_eq!(result.timeout, Duration::from_millis(750));
        assert_eq!(result.max_body_bytes, None);
        assert_eq!(
            result.keywords,
            Some(vec!["rust".to_string(), "tokio".to_string()])
        );
    }

    #[test]
    fn test_resolve_path_precedence() {
        let file_config = file_config_with_paths("file-in.txt", "file-out.csv");

        assert_eq!(
            resolve_path(Some("cli.txt"), Some("env.txt"), &file_config, FileConfig::input, "d"),
            "cli.txt"
        );
        assert_eq!(
            resolve_path(None, Some("env.txt"), &file_config, FileConfig::input, "d"),
            "env.txt"
        );
        assert_eq!(
            resolve_path(None, None, &file_config, FileConfig::input, "d"),
            "file-in.txt"
        );
        assert_eq!(
            resolve_path(None, None, &FileConfig::default(), FileConfig::output, DEFAULT_OUTPUT_FILE),
            "checkedURLs.csv"
        );
    }

    fn file_config_with_paths(input: &str, output: &str) -> FileConfig {
        FileConfig {
            defaults: Some(DefaultsConfig {
                input: Some(input.to_string()),
                output: Some(output.to_string()),
                ..Default::default()
            }),
            vocabulary: None,
        }
    }

    #[test]
    fn test_failure_stats_grouping() {
        let failures = vec![
            FetchFailure {
                url: "https://slow.com".to_string(),
                reason: ScanError::timeout("GET https://slow.com", Duration::from_secs(5)),
            },
            FetchFailure {
                url: "https://down.com".to_string(),
                reason: ScanError::network("Connection failed"),
            },
            FetchFailure {
                url: "https://cut.com".to_string(),
                reason: ScanError::body_read("https://cut.com", "connection reset"),
            },
            FetchFailure {
                url: "https://slower.com".to_string(),
                reason: ScanError::timeout("GET https://slower.com", Duration::from_secs(5)),
            },
        ];

        let stats = FailureStats::from_failures(&failures);
        assert_eq!(stats.timeouts, vec!["https://slow.com", "https://slower.com"]);
        assert_eq!(stats.network_errors, vec!["https://down.com"]);
        assert_eq!(stats.other_errors, vec!["https://cut.com"]);
        assert_eq!(stats.total(), 4);
        assert!(stats.has_failures());
        assert!(!FailureStats::default().has_failures());
    }

    #[test]
    fn test_ensure_output_writable() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("out.csv");
        assert!(ensure_output_writable(ok.to_str().unwrap()).is_ok());

        let bad = dir.path().join("nope").join("out.csv");
        assert!(ensure_output_writable(bad.to_str().unwrap()).is_err());
    }
}
