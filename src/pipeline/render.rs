//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## One width for the whole document
//!
//! The stitcher blits pages at x = 0 without scaling, so every page must come
//! out the same pixel width. [`PdfiumRenderer`] derives the target width from
//! the first page (`points × dpi / 72`) and asks pdfium to render every page
//! at that width, preserving each page's aspect ratio. For a document whose
//! pages all share one physical width this is exactly "render at `dpi`".
//!
//! ## Rendering is a seam
//!
//! [`PageRenderer`] lets the orchestrator run against a fake in tests and
//! keeps pdfium out of everything except this module.

use crate::error::PdfStitchError;
use image::DynamicImage;
use pdfium_provision::{DownloadProgress, Provisioner};
use pdfium_render::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Pages of one document in page order.
///
/// Produced by a [`PageRenderer`]; renderers guarantee every page has the
/// same pixel width.
#[derive(Debug, Clone, Default)]
pub struct PageSequence {
    pages: Vec<DynamicImage>,
}

impl PageSequence {
    pub fn new(pages: Vec<DynamicImage>) -> Self {
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Width of the first page, `None` when empty.
    pub fn width(&self) -> Option<u32> {
        self.pages.first().map(DynamicImage::width)
    }

    pub fn heights(&self) -> Vec<u32> {
        self.pages.iter().map(DynamicImage::height).collect()
    }

    pub fn pages(&self) -> &[DynamicImage] {
        &self.pages
    }

}

impl From<Vec<DynamicImage>> for PageSequence {
    fn from(pages: Vec<DynamicImage>) -> Self {
        Self::new(pages)
    }
}

/// Turns a PDF on disk into page images.
pub trait PageRenderer {
    /// Rasterise every page of `pdf_path` at `dpi`.
    ///
    /// Either returns all pages in document order or fails; never a partial
    /// sequence.
    fn render(
        &self,
        pdf_path: &Path,
        dpi: u32,
        password: Option<&str>,
    ) -> Result<PageSequence, PdfStitchError>;
}

/// Pixel width of a page `width_points` wide at `dpi` (1 pt = 1/72 in).
pub fn target_width_px(width_points: f32, dpi: u32) -> i32 {
    ((width_points * dpi as f32) / 72.0).round().max(1.0) as i32
}

/// [`PageRenderer`] backed by a bound pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Startup capability check: locate (or download) pdfium and bind it.
    ///
    /// Call once per process; fails with
    /// [`PdfStitchError::MissingCapability`] when no library can be bound.
    pub fn initialise(on_progress: Option<DownloadProgress<'_>>) -> Result<Self, PdfStitchError> {
        Self::with_provisioner(&Provisioner::from_env(), on_progress)
    }

    pub fn with_provisioner(
        provisioner: &Provisioner,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<Self, PdfStitchError> {
        let (pdfium, source) = provisioner.bind(on_progress)?;
        info!("PDF engine ready ({source})");
        Ok(Self::new(pdfium))
    }

    fn load<'a>(
        &'a self,
        pdf_path: &Path,
        password: Option<&'a str>,
    ) -> Result<PdfDocument<'a>, PdfStitchError> {
        self.pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| {
                let detail = format!("{e:?}");
                if detail.contains("Password") || detail.contains("password") {
                    PdfStitchError::PasswordRequired {
                        path: pdf_path.to_path_buf(),
                    }
                } else {
                    PdfStitchError::RenderFailure {
                        path: pdf_path.to_path_buf(),
                        detail,
                    }
                }
            })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(
        &self,
        pdf_path: &Path,
        dpi: u32,
        password: Option<&str>,
    ) -> Result<PageSequence, PdfStitchError> {
        if !pdf_path.exists() {
            return Err(PdfStitchError::DocumentNotFound {
                path: pdf_path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let document = self.load(pdf_path, password)?;
        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded: {} pages", total);

        if total == 0 {
            return Ok(PageSequence::default());
        }

        let render_failure = |page: usize, e: PdfiumError| PdfStitchError::RenderFailure {
            path: pdf_path.to_path_buf(),
            detail: format!("page {page}: {e:?}"),
        };

        let first = pages.get(0).map_err(|e| render_failure(1, e))?;
        let width = target_width_px(first.width().value, dpi);
        let render_config = PdfRenderConfig::new().set_target_width(width);
        debug!("Rendering at {} DPI → {} px wide", dpi, width);

        let mut images = Vec::with_capacity(total);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| render_failure(idx + 1, e))?;
            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        info!(
            "Rendered {} pages in {}ms",
            images.len(),
            start.elapsed().as_millis()
        );
        Ok(PageSequence::new(images))
    }
}
