//! Batch conversion over a directory of PDFs.
//!
//! A thin loop over [`crate::convert::convert_file`]: each PDF directly inside
//! the directory (no recursion) becomes `<output_dir>/<stem>_stitched.png`.
//! One file failing never stops the rest; the [`BatchResult`] carries a
//! per-file record plus success/failure counts.

use crate::config::ConversionOptions;
use crate::convert::{convert_file, OUTPUT_SUFFIX};
use crate::error::PdfStitchError;
use crate::output::{BatchEntry, BatchResult};
use crate::pipeline::render::PageRenderer;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the default output directory created inside the PDF directory.
pub const DEFAULT_OUTPUT_DIR: &str = "converted";

/// Regular files in `dir` with a `.pdf` extension (any case), sorted by name.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, PdfStitchError> {
    if !dir.is_dir() {
        return Err(PdfStitchError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| PdfStitchError::Internal(format!(
        "cannot list '{}': {e}",
        dir.display()
    )))?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Convert every PDF in `pdf_dir`.
///
/// `output_dir = None` uses `<pdf_dir>/converted`, created if missing.
pub fn convert_batch<R: PageRenderer + ?Sized>(
    renderer: &R,
    pdf_dir: &Path,
    output_dir: Option<&Path>,
    options: &ConversionOptions,
) -> BatchResult {
    info!("Batch converting directory: {}", pdf_dir.display());

    let pdfs = match list_pdf_files(pdf_dir) {
        Ok(p) if p.is_empty() => {
            return BatchResult::aborted(&PdfStitchError::NoPdfFiles {
                path: pdf_dir.to_path_buf(),
            })
        }
        Ok(p) => p,
        Err(e) => return BatchResult::aborted(&e),
    };

    let out_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| pdf_dir.join(DEFAULT_OUTPUT_DIR));
    if let Err(source) = std::fs::create_dir_all(&out_dir) {
        return BatchResult::aborted(&PdfStitchError::OutputWriteFailed {
            path: out_dir,
            source,
        });
    }

    let total = pdfs.len();
    info!("Found {} PDF files", total);
    if let Some(ref cb) = options.progress_callback {
        cb.on_batch_start(total);
    }

    let mut entries = Vec::with_capacity(total);
    for (i, pdf) in pdfs.iter().enumerate() {
        let file = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = out_dir.join(format!("{stem}{OUTPUT_SUFFIX}.png"));

        info!("[{}/{}] {}", i + 1, total, file);
        let result = convert_file(renderer, pdf, Some(&target), options);

        if let Some(ref cb) = options.progress_callback {
            cb.on_batch_file_complete(i + 1, total, &file, result.success);
        }
        entries.push(BatchEntry { file, result });
    }

    let batch = BatchResult::from_entries(entries);
    info!(
        "Batch complete: {} succeeded, {} failed",
        batch.success_count, batch.fail_count
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_top_level_pdfs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/d.pdf"), b"%PDF").unwrap();
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();

        let names: Vec<String> = list_pdf_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn missing_directory() {
        let err = list_pdf_files(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, PdfStitchError::DirectoryNotFound { .. }));
    }
}
