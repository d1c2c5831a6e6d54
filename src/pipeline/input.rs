//! Input checks for local PDFs, and URL downloads.
//!
//! pdfium only opens documents from disk, so a URL is fetched into a private
//! `TempDir` owned by [`DownloadedPdf`]. The directory goes away when that
//! value is dropped, on success and failure alike.
//!
//! Both sources are sniffed for the `%PDF` header before rendering; an HTML
//! error page or a mislabelled image then reports `NotAPdf` rather than an
//! opaque pdfium status.

use crate::error::PdfStitchError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Used when the URL has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "downloaded.pdf";

/// A PDF fetched from a URL, alive as long as this value is.
#[derive(Debug)]
pub struct DownloadedPdf {
    path: PathBuf,
    _dir: TempDir,
}

impl DownloadedPdf {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `http://` and `https://` inputs are URLs; anything else is a path.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Fails with `NotAPdf` when `head` is long enough to judge and is not `%PDF`.
fn sniff(head: &[u8], origin: impl Into<PathBuf>) -> Result<(), PdfStitchError> {
    match head.get(..PDF_MAGIC.len()) {
        Some(magic) if magic != PDF_MAGIC => {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            Err(PdfStitchError::NotAPdf {
                path: origin.into(),
                magic: found,
            })
        }
        _ => Ok(()),
    }
}

/// Check that `path` is an existing file, can be opened, and starts like a PDF.
pub fn resolve_local(path: &Path) -> Result<PathBuf, PdfStitchError> {
    if !path.is_file() {
        return Err(PdfStitchError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PdfStitchError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PdfStitchError::DocumentNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.by_ref()
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| PdfStitchError::Internal(format!("reading '{}': {e}", path.display())))?;
    sniff(&head, path)?;

    debug!("Input OK: {}", path.display());
    Ok(path.to_path_buf())
}

/// Fetch `url` into a fresh temp directory, giving up after `timeout_secs`.
pub async fn download_url(url: &str, timeout_secs: u64) -> Result<DownloadedPdf, PdfStitchError> {
    if !is_url(url) {
        return Err(PdfStitchError::InvalidUrl {
            url: url.to_string(),
        });
    }

    let failed = |reason: String| PdfStitchError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            PdfStitchError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    info!("Fetching {} (timeout {}s)", url, timeout_secs);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(classify)?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {status}")));
    }
    let body = response.bytes().await.map_err(classify)?;
    sniff(&body, url)?;

    let dir = TempDir::new().map_err(|e| PdfStitchError::Internal(format!("temp dir: {e}")))?;
    let path = dir.path().join(filename_from_url(url));
    tokio::fs::write(&path, &body)
        .await
        .map_err(|source| PdfStitchError::OutputWriteFailed {
            path: path.clone(),
            source,
        })?;

    info!("Fetched {} bytes into {}", body.len(), path.display());
    Ok(DownloadedPdf { path, _dir: dir })
}

/// Last path segment of `url` when it looks like a file name.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| name.contains('.'))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/slides.pdf"));
        assert!(is_url("http://example.com/slides.pdf"));
        assert!(!is_url("slides.pdf"));
        assert!(!is_url("ftp://example.com/slides.pdf"));
    }

    #[test]
    fn file_name_from_last_segment() {
        assert_eq!(filename_from_url("https://example.com/a/deck.pdf"), "deck.pdf");
        assert_eq!(
            filename_from_url("https://example.com/a/deck.pdf?x=1"),
            "deck.pdf"
        );
        assert_eq!(filename_from_url("https://arxiv.org/pdf/1706"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn sniff_short_input_is_left_to_pdfium() {
        assert!(sniff(b"%P", "x").is_ok());
        assert!(sniff(b"", "x").is_ok());
        assert!(sniff(b"%PDF-2.0", "x").is_ok());
    }

    #[test]
    fn missing_local_file() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, PdfStitchError::DocumentNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert!(matches!(err, PdfStitchError::DocumentNotFound { .. }));
    }

    #[test]
    fn png_renamed_to_pdf_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"\x89PNG\r\n\x1a\n").unwrap();
        match resolve_local(f.path()).unwrap_err() {
            PdfStitchError::NotAPdf { magic, .. } => assert_eq!(&magic, b"\x89PNG"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn pdf_header_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_local(f.path()).unwrap(), f.path());
    }

    #[tokio::test]
    async fn non_http_scheme_rejected() {
        let err = download_url("file:///etc/passwd", 5).await.unwrap_err();
        assert!(matches!(err, PdfStitchError::InvalidUrl { .. }));
    }
}
