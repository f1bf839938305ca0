//! Error handling for scanning operations.
//!
//! Per-host errors (network, timeout, body read) are contained inside that
//! host's task. File and configuration errors are the only fatal ones.

use std::fmt;
use std::time::Duration;

/// Main error type for scanning operations.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Input line or URL that cannot become a fetch target
    InvalidTarget { target: String, reason: String },

    /// Connection, DNS or TLS failures
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The fetch did not complete within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The response started but the body could not be read completely
    BodyReadError { url: String, message: String },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError { message: String },

    /// File I/O errors for the input list or the output file
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ScanError {
    /// Create a new invalid target error.
    pub fn invalid_target<T: Into<String>, R: Into<String>>(target: T, reason: R) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new body read error.
    pub fn body_read<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::BodyReadError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a reqwest error raised while fetching `url`.
    ///
    /// `timeout` is the configured per-fetch bound, reported back when the
    /// client gives up on the deadline.
    pub fn from_fetch(url: &str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("GET {}", url), timeout)
        } else if err.is_body() || err.is_decode() {
            Self::body_read(url, err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }

    /// Whether this error came from the per-fetch deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error is a connection/DNS/TLS level failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkError { .. })
    }

    /// Whether this error should stop the whole run rather than a single host.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FileError { .. } | Self::ConfigError { .. })
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { target, reason } => {
                write!(f, "Invalid target '{}': {}", target, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::BodyReadError { url, message } => {
                write!(f, "Failed to read body of '{}': {}", url, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScanError {}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP client error", err.to_string())
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
