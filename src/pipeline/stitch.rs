//! Vertical stitching: stack page images on one canvas with fixed spacing.
//!
//! Canvas width is the first page's width; canvas height is
//! `Σ heights + spacing × (pages − 1)`. Pages are blitted at x = 0 in order,
//! each converted to 8-bit RGB first (alpha is dropped, not composited).
//!
//! Uniform page width is a precondition owned by the renderer. A wider page
//! is clipped at the right edge and a narrower one leaves background showing;
//! neither is an error here.

use crate::error::PdfStitchError;
use crate::pipeline::render::PageSequence;
use image::{imageops, DynamicImage, Rgb, RgbImage};
use std::borrow::Cow;
use tracing::debug;

/// Height of the composite for pages of `heights` separated by `spacing`.
///
/// `None` for zero pages: there is no `pages − 1` gap count to speak of.
pub fn composite_height(heights: &[u32], spacing: u32) -> Option<u64> {
    if heights.is_empty() {
        return None;
    }
    let pages: u64 = heights.iter().map(|&h| u64::from(h)).sum();
    let gaps = u64::from(spacing) * (heights.len() as u64 - 1);
    Some(pages + gaps)
}

/// Stack `pages` top to bottom on a `background` canvas.
pub fn stitch(
    pages: &PageSequence,
    spacing: u32,
    background: Rgb<u8>,
) -> Result<RgbImage, PdfStitchError> {
    let width = pages.width().ok_or(PdfStitchError::EmptyInput)?;
    let total_height =
        composite_height(&pages.heights(), spacing).ok_or(PdfStitchError::EmptyInput)?;

    let too_large = || PdfStitchError::CanvasTooLarge {
        width: u64::from(width),
        height: total_height,
    };
    let height = u32::try_from(total_height).map_err(|_| too_large())?;
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .ok_or_else(too_large)?;

    debug!(
        "Stitching {} pages → {}x{} px (spacing {} px)",
        pages.len(),
        width,
        height,
        spacing
    );

    let mut canvas = RgbImage::from_pixel(width, height, background);
    let step = (pages.len() / 10).max(1);
    let mut y: i64 = 0;

    for (i, page) in pages.pages().iter().enumerate() {
        let rgb = to_rgb(page);
        imageops::replace(&mut canvas, &*rgb, 0, y);
        y += i64::from(rgb.height()) + i64::from(spacing);

        if (i + 1) % step == 0 || i + 1 == pages.len() {
            debug!("Stitched {}/{}", i + 1, pages.len());
        }
    }

    Ok(canvas)
}

fn to_rgb(page: &DynamicImage) -> Cow<'_, RgbImage> {
    match page {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        other => Cow::Owned(other.to_rgb8()),
    }
}
