//! Result records returned by the conversion entry points.
//!
//! These are the only values that cross the library/caller boundary. Both
//! serialise to the JSON the CLI prints on stdout; `None` fields are omitted
//! so a failure record is just `success`, `error`, `error_kind` and timing.

use crate::error::{ErrorKind, PdfStitchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of converting one PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,

    /// Absolute path of the written image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Size of the written image in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,

    /// Human-readable size, e.g. `"2.41 MB"` or `"730 KB"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_str: Option<String>,

    /// Number of pages stitched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Wall-clock time of the whole conversion.
    #[serde(default)]
    pub duration_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Facts about a successfully written composite.
#[derive(Debug, Clone)]
pub struct WrittenImage {
    pub path: PathBuf,
    pub file_size: u64,
    pub pages: usize,
    pub width: u32,
    pub height: u32,
}

impl ConversionResult {
    pub fn succeeded(written: WrittenImage, duration_ms: u64) -> Self {
        let mb = written.file_size as f64 / (1024.0 * 1024.0);
        Self {
            success: true,
            output_path: Some(written.path),
            file_size: Some(written.file_size),
            file_size_mb: Some(mb),
            file_size_str: Some(format_file_size(written.file_size)),
            pages: Some(written.pages),
            width: Some(written.width),
            height: Some(written.height),
            duration_ms,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(error: &PdfStitchError, duration_ms: u64) -> Self {
        Self {
            success: false,
            output_path: None,
            file_size: None,
            file_size_mb: None,
            file_size_str: None,
            pages: None,
            width: None,
            height: None,
            duration_ms,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

/// Per-file entry of a [`BatchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// File name relative to the batch directory.
    pub file: String,
    pub result: ConversionResult,
}

/// Outcome of a batch run over a directory.
///
/// `success` is true when the directory was scanned and every file was
/// attempted; individual failures show up in `fail_count` and `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub total: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<BatchEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl BatchResult {
    /// Tally `results` into a completed batch record.
    pub fn from_entries(results: Vec<BatchEntry>) -> Self {
        let success_count = results.iter().filter(|e| e.result.success).count();
        Self {
            success: true,
            total: results.len(),
            success_count,
            fail_count: results.len() - success_count,
            results,
            error: None,
            error_kind: None,
        }
    }

    /// Batch that could not start (missing directory, no PDFs, …).
    pub fn aborted(error: &PdfStitchError) -> Self {
        Self {
            success: false,
            total: 0,
            success_count: 0,
            fail_count: 0,
            results: Vec::new(),
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

/// `"1.50 MB"` from one MiB upward, whole kilobytes below.
pub fn format_file_size(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1.0 {
        format!("{mb:.2} MB")
    } else {
        format!("{:.0} KB", mb * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 / 2), "1.50 MB");
        assert_eq!(format_file_size(512 * 1024), "512 KB");
        assert_eq!(format_file_size(0), "0 KB");
    }

    #[test]
    fn failure_json_omits_image_fields() {
        let err = PdfStitchError::DocumentNotFound {
            path: PathBuf::from("missing.pdf"),
        };
        let json = serde_json::to_value(ConversionResult::failed(&err, 1)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "document_not_found");
        assert!(json["error"].as_str().unwrap().contains("missing.pdf"));
        assert!(json.get("output_path").is_none());
        assert!(json.get("pages").is_none());
    }

    #[test]
    fn success_record_fields() {
        let r = ConversionResult::succeeded(
            WrittenImage {
                path: PathBuf::from("/out/deck_stitched.png"),
                file_size: 2 * 1024 * 1024,
                pages: 3,
                width: 1000,
                height: 4220,
            },
            42,
        );
        assert!(r.success);
        assert_eq!(r.file_size_str.as_deref(), Some("2.00 MB"));
        assert_eq!(r.file_size_mb, Some(2.0));
        assert_eq!(r.height, Some(4220));
        assert!(r.error.is_none());
    }

    #[test]
    fn batch_tally() {
        let ok = ConversionResult::succeeded(
            WrittenImage {
                path: PathBuf::from("a.png"),
                file_size: 10,
                pages: 1,
                width: 1,
                height: 1,
            },
            0,
        );
        let bad = ConversionResult::failed(&PdfStitchError::EmptyInput, 0);
        let batch = BatchResult::from_entries(vec![
            BatchEntry { file: "a.pdf".into(), result: ok.clone() },
            BatchEntry { file: "b.pdf".into(), result: bad },
            BatchEntry { file: "c.pdf".into(), result: ok },
        ]);
        assert!(batch.success);
        assert_eq!((batch.total, batch.success_count, batch.fail_count), (3, 2, 1));
    }

    #[test]
    fn aborted_batch_has_no_results() {
        let b = BatchResult::aborted(&PdfStitchError::NoPdfFiles {
            path: PathBuf::from("empty"),
        });
        assert!(!b.success);
        assert!(b.results.is_empty());
        assert_eq!(b.error_kind, Some(ErrorKind::EmptyInput));
    }
}
