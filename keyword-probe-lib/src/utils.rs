//! Utility functions for loading targets and parsing settings.

use crate::error::ScanError;
use crate::types::HostTarget;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Turn the contents of a host list into fetch targets.
///
/// One host (or host/path) per line. Blank lines and `#` comments are
/// skipped; scheme-less lines get `https://`.
pub fn parse_targets(content: &str) -> Vec<HostTarget> {
    content.lines().filter_map(HostTarget::from_line).collect()
}

/// Read a host list file.
///
/// # Errors
///
/// Returns `ScanError::FileError` if the file does not exist or cannot be
/// read. A file with no usable lines yields an empty list.
pub fn load_targets_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<HostTarget>, ScanError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ScanError::file_error(
            path.to_string_lossy(),
            "Input file not found",
        ));
    }

    let bytes = fs::read(path).map_err(|e| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to read input file: {}", e),
        )
    })?;

    Ok(parse_targets(&String::from_utf8_lossy(&bytes)))
}

/// Parse a timeout string like "500ms", "5s", "2m" into a duration.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let duration = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    };

    duration.filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout_string("30S"), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout_string("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_timeout_string("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout_string("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout_string("0s"), None);
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_parse_targets() {
        let content = "example.com\n\n  plain.com  \n# comment\nhttp://localhost:9000/x\r\n";
        let targets = parse_targets(content);
        let urls: Vec<&str> = targets.iter().map(|t| t.url()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com",
                "https://plain.com",
                "http://localhost:9000/x"
            ]
        );
    }

    #[test]
    fn test_load_targets_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"example.com\nplain.com\ndown.com").unwrap();
        file.flush().unwrap();

        let targets = load_targets_from_file(file.path()).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[2].url(), "https://down.com");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load_targets_from_file("/definitely/not/here/SaaS.txt").unwrap_err();
        assert!(matches!(err, ScanError::FileError { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_file_without_hosts_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\n\n# nothing\n").unwrap();
        file.flush().unwrap();

        assert!(load_targets_from_file(file.path()).unwrap().is_empty());
    }
}
