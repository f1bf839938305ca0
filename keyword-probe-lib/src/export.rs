//! Delimited-text export of a result set.
//!
//! Row layout:
//! - matched: `url,true,keyword1;keyword2`
//! - unmatched: `url,false`

use crate::error::ScanError;
use crate::types::{ResultSet, Verdict};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Format one verdict as a row, without the line terminator.
pub fn format_verdict_row(verdict: &Verdict) -> String {
    if verdict.matched {
        format!(
            "{},true,{}",
            escape_field(&verdict.url),
            escape_field(&verdict.keywords.join(";"))
        )
    } else {
        format!("{},false", escape_field(&verdict.url))
    }
}

/// Write every verdict to `path`, one row each. The file is truncated first.
///
/// # Errors
///
/// Returns `ScanError::FileError` if the file cannot be created or written.
pub fn write_results_csv<P: AsRef<Path>>(path: P, results: &ResultSet) -> Result<(), ScanError> {
    let path = path.as_ref();
    let to_file_error = |e: std::io::Error| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to write output file: {}", e),
        )
    };

    let file = File::create(path).map_err(|e| {
        ScanError::file_error(
            path.to_string_lossy(),
            format!("Failed to create output file: {}", e),
        )
    })?;

    let mut writer = BufWriter::new(file);
    for verdict in results {
        writeln!(writer, "{}", format_verdict_row(verdict)).map_err(to_file_error)?;
    }
    writer.flush().map_err(to_file_error)?;

    Ok(())
}

/// Quote a field when it contains the delimiter, quotes or line breaks, or
/// starts with whitespace. Same rule as Go's `encoding/csv` writer.
fn escape_field(field: &str) -> String {
    let needs_quotes = field == "\\."
        || field.contains([',', '"', '\n', '\r'])
        || field.starts_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_matched_row() {
        let verdict = Verdict::new(
            "https://example.com",
            vec!["machine learning".to_string(), "big data".to_string()],
        );
        assert_eq!(
            format_verdict_row(&verdict),
            "https://example.com,true,machine learning;big data"
        );
    }

    #[test]
    fn test_unmatched_row_has_two_columns() {
        let verdict = Verdict::new("https://plain.com", vec![]);
        assert_eq!(format_verdict_row(&verdict), "https://plain.com,false");
    }

    #[test]
    fn test_fields_with_special_characters_are_quoted() {
        let verdict = Verdict::new(
            "https://odd.com/?a=1,2",
            vec![" ai\n".to_string(), "say \"hi\"".to_string()],
        );
        assert_eq!(
            format_verdict_row(&verdict),
            "\"https://odd.com/?a=1,2\",true,\" ai\n;say \"\"hi\"\"\""
        );
    }

    #[test]
    fn test_leading_whitespace_field_is_quoted() {
        let verdict = Verdict::new("https://vendor.com", vec![" ai ".to_string()]);
        assert_eq!(format_verdict_row(&verdict), "https://vendor.com,true,\" ai \"");

        // Only the joined field's first character counts.
        let verdict = Verdict::new(
            "https://vendor.com",
            vec!["machine learning".to_string(), " ai ".to_string()],
        );
        assert_eq!(
            format_verdict_row(&verdict),
            "https://vendor.com,true,machine learning; ai "
        );

        assert_eq!(escape_field("\tnlp"), "\"\tnlp\"");
    }

    #[test]
    fn test_write_results_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkedURLs.csv");

        let results = ResultSet::new(vec![
            Verdict::new("https://example.com", vec!["big data".to_string()]),
            Verdict::new("https://plain.com", vec![]),
        ]);
        write_results_csv(&path, &results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "https://example.com,true,big data\nhttps://plain.com,false\n"
        );
    }

    #[test]
    fn test_write_empty_result_set_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_results_csv(&path, &ResultSet::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_uncreatable_output_is_file_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");
        let err = write_results_csv(&path, &ResultSet::default()).unwrap_err();
        assert!(matches!(err, ScanError::FileError { .. }));
    }
}
