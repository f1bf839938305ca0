//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `KP_*`
//! environment variables, and merging them with proper precedence rules.

use crate::error::ScanError;
use crate::types::{ScanConfig, MAX_CONCURRENCY};
use crate::utils::parse_timeout_string;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Keyword vocabulary override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<VocabularyConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Admission capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-fetch timeout (as string, e.g., "5s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Body cap in bytes, 0 for unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_body_bytes: Option<usize>,

    /// Host list path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Result file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Replacement keyword list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VocabularyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl FileConfig {
    /// Apply the file's settings on top of `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config = config.with_concurrency(concurrency);
            }
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = timeout;
            }
            if let Some(max) = defaults.max_body_bytes {
                config = config.with_max_body_bytes(max);
            }
        }
        if let Some(keywords) = self.vocabulary.as_ref().and_then(|v| v.keywords.clone()) {
            config.keywords = Some(keywords);
        }
        config
    }

    /// Configured input path, if any.
    pub fn input(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.input.as_deref())
    }

    /// Configured output path, if any.
    pub fn output(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.output.as_deref())
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScanError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ScanError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest precedence, then the home directory, then
    /// the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScanError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = self.merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        if self.verbose && loaded_files.len() > 1 {
            eprintln!("⚠️  Multiple config files found. Using precedence:");
            for (i, path) in loaded_files.iter().enumerate() {
                let status = if i == loaded_files.len() - 1 {
                    "highest"
                } else {
                    "overridden"
                };
                eprintln!("   {} ({})", path.display(), status);
            }
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./keyword-probe.toml", "./.keyword-probe.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".keyword-probe.toml", "keyword-probe.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|p| p.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("keyword-probe").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations. Values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.max_body_bytes.is_some() {
                        lower_defaults.max_body_bytes = higher_defaults.max_body_bytes;
                    }
                    if higher_defaults.input.is_some() {
                        lower_defaults.input = higher_defaults.input;
                    }
                    if higher_defaults.output.is_some() {
                        lower_defaults.output = higher_defaults.output;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            // Keyword lists replace each other; they are never concatenated.
            vocabulary: match (lower.vocabulary, higher.vocabulary) {
                (Some(lower_vocab), Some(higher_vocab)) => Some(VocabularyConfig {
                    keywords: higher_vocab.keywords.or(lower_vocab.keywords),
                }),
                (lower_vocab, higher_vocab) => higher_vocab.or(lower_vocab),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ScanError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(ScanError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ScanError::config(format!(
                        "Invalid timeout format '{}'. Use format like '500ms', '5s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(keywords) = config.vocabulary.as_ref().and_then(|v| v.keywords.as_ref()) {
            if keywords.is_empty() {
                return Err(ScanError::config("Vocabulary keyword list cannot be empty"));
            }
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ScanError::config("Vocabulary keywords cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via KP_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<String>,
    pub max_body_bytes: Option<usize>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply the environment settings on top of `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(timeout) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config.timeout = timeout;
        }
        if let Some(max) = self.max_body_bytes {
            config = config.with_max_body_bytes(max);
        }
        if let Some(keywords) = &self.keywords {
            config.keywords = Some(keywords.clone());
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Parses all KP_* environment variables. Invalid values are reported in
/// verbose mode and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // KP_CONCURRENCY - admission capacity
    if let Ok(val) = env::var("KP_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= MAX_CONCURRENCY => {
                env_config.concurrency = Some(concurrency);
                if verbose {
                    eprintln!("🔧 Using KP_CONCURRENCY={}", concurrency);
                }
            }
            _ => {
                if verbose {
                    eprintln!(
                        "⚠️ Invalid KP_CONCURRENCY='{}', must be 1-{}",
                        val, MAX_CONCURRENCY
                    );
                }
            }
        }
    }

    // KP_TIMEOUT - per-fetch timeout
    if let Ok(timeout_str) = env::var("KP_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            env_config.timeout = Some(timeout_str.clone());
            if verbose {
                eprintln!("🔧 Using KP_TIMEOUT={}", timeout_str);
            }
        } else if verbose {
            eprintln!(
                "⚠️ Invalid KP_TIMEOUT='{}', use format like '500ms', '5s', '2m'",
                timeout_str
            );
        }
    }

    // KP_MAX_BODY_BYTES - body cap
    if let Ok(val) = env::var("KP_MAX_BODY_BYTES") {
        match val.trim().parse::<usize>() {
            Ok(max) => {
                env_config.max_body_bytes = Some(max);
                if verbose {
                    eprintln!("🔧 Using KP_MAX_BODY_BYTES={}", max);
                }
            }
            Err(_) => {
                if verbose {
                    eprintln!("⚠️ Invalid KP_MAX_BODY_BYTES='{}', expected bytes", val);
                }
            }
        }
    }

    // KP_INPUT / KP_OUTPUT / KP_CONFIG - file paths
    env_config.input = non_empty_var("KP_INPUT", verbose);
    env_config.output = non_empty_var("KP_OUTPUT", verbose);
    env_config.config = non_empty_var("KP_CONFIG", verbose);

    // KP_KEYWORDS - comma-separated vocabulary override
    if let Ok(keyword_str) = env::var("KP_KEYWORDS") {
        let keywords = split_keywords(&keyword_str);
        if !keywords.is_empty() {
            env_config.keywords = Some(keywords);
            if verbose {
                eprintln!("🔧 Using KP_KEYWORDS={}", keyword_str);
            }
        }
    }

    env_config
}

/// Split a comma-separated keyword list, trimming entries and dropping blanks.
pub fn split_keywords(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(name: &str, verbose: bool) -> Option<String> {
    let value = env::var(name).ok()?;
    if value.trim().is_empty() {
        return None;
    }
    if verbose {
        eprintln!("🔧 Using {}={}", name, value);
    }
    Some(value)
}
