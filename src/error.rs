//! Error types for the edgequake-pdfstitch library.
//!
//! Every failure inside a conversion is a [`PdfStitchError`]. The public
//! `convert*` entry points never return it directly: they fold it into a
//! [`crate::output::ConversionResult`] with `success = false`, so a caller
//! (and the CLI's JSON output) always gets a result record.
//!
//! [`ErrorKind`] is the coarse class of an error. It is serialised next to the
//! message so scripts can branch on `error_kind` without parsing English.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`PdfStitchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input file or directory does not exist.
    DocumentNotFound,
    /// PDFium could not open or rasterise the document.
    RenderFailure,
    /// Nothing to stitch: zero pages, or no PDFs in a batch directory.
    EmptyInput,
    /// Reading, writing or downloading failed.
    IoFailure,
    /// The PDFium library could not be found or bound at startup.
    MissingCapability,
    /// Options or arguments are out of range.
    InvalidInput,
    Internal,
}

/// All errors raised by the edgequake-pdfstitch library.
#[derive(Debug, Error)]
pub enum PdfStitchError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    DocumentNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("PDF '{path}' is encrypted; provide the password with --password")]
    PasswordRequired { path: PathBuf },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// PDFium could not load or rasterise the document.
    #[error("Rendering '{path}' failed: {detail}")]
    RenderFailure { path: PathBuf, detail: String },

    /// The stitcher received zero pages.
    #[error("No pages to stitch: the document has no pages")]
    EmptyInput,

    /// The composite would not fit in a single image buffer.
    #[error("Composite image {width}x{height} px exceeds the maximum image size")]
    CanvasTooLarge { width: u64, height: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output image.
    #[error("Failed to write output image '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image encoder rejected the composite.
    #[error("Failed to encode output image '{path}': {detail}")]
    EncodeFailed { path: PathBuf, detail: String },

    /// Input string is not an HTTP/HTTPS URL.
    #[error("Invalid URL '{url}': only http:// and https:// are supported")]
    InvalidUrl { url: String },

    /// HTTP download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Batch input directory does not exist.
    #[error("Directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// Batch input directory has no `.pdf` files.
    #[error("No PDF files found in '{path}'")]
    NoPdfFiles { path: PathBuf },

    // ── Startup / config errors ───────────────────────────────────────────
    /// PDFium is unavailable.
    #[error(
        "PDF rendering engine unavailable: {0}\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    MissingCapability(String),

    /// Options failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfStitchError {
    /// The error's class in the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfStitchError::DocumentNotFound { .. } | PdfStitchError::DirectoryNotFound { .. } => {
                ErrorKind::DocumentNotFound
            }
            PdfStitchError::NotAPdf { .. }
            | PdfStitchError::PasswordRequired { .. }
            | PdfStitchError::RenderFailure { .. } => ErrorKind::RenderFailure,
            PdfStitchError::EmptyInput | PdfStitchError::NoPdfFiles { .. } => ErrorKind::EmptyInput,
            PdfStitchError::PermissionDenied { .. }
            | PdfStitchError::OutputWriteFailed { .. }
            | PdfStitchError::EncodeFailed { .. }
            | PdfStitchError::DownloadFailed { .. }
            | PdfStitchError::DownloadTimeout { .. } => ErrorKind::IoFailure,
            PdfStitchError::MissingCapability(_) => ErrorKind::MissingCapability,
            PdfStitchError::InvalidUrl { .. }
            | PdfStitchError::CanvasTooLarge { .. }
            | PdfStitchError::InvalidConfig(_) => ErrorKind::InvalidInput,
            PdfStitchError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<pdfium_provision::ProvisionError> for PdfStitchError {
    fn from(e: pdfium_provision::ProvisionError) -> Self {
        PdfStitchError::MissingCapability(e.to_string())
    }
}
