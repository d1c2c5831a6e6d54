//! Single-document conversion entry points.
//!
//! [`convert_file`] is the core contract: existence check → render → stitch
//! → write → stat, folded into a [`ConversionResult`]. It never returns an
//! error; every failure becomes `success = false` with a message and an
//! [`crate::error::ErrorKind`], and no output file is written.
//!
//! [`convert_url`] and [`convert`] are thin async wrappers that resolve the
//! input first (downloading URLs into a temp dir) and then delegate.

use crate::config::ConversionOptions;
use crate::error::PdfStitchError;
use crate::output::{ConversionResult, WrittenImage};
use crate::pipeline::render::PageRenderer;
use crate::pipeline::{encode, input, stitch};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Appended to the input stem to name the default output.
pub const OUTPUT_SUFFIX: &str = "_stitched";

/// `<dir>/<stem>_stitched.png` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.png"))
}

/// Convert one local PDF into a stitched image.
///
/// `output = None` writes next to the input (see [`default_output_path`]).
pub fn convert_file<R: PageRenderer + ?Sized>(
    renderer: &R,
    pdf_path: impl AsRef<Path>,
    output: Option<&Path>,
    options: &ConversionOptions,
) -> ConversionResult {
    let start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(pdf_path));

    info!("Converting PDF: {}", pdf_path.display());
    if let Some(ref cb) = options.progress_callback {
        cb.on_conversion_start(pdf_path);
    }

    let result = match run(renderer, pdf_path, &output_path, options) {
        Ok(written) => {
            info!(
                "Saved {} ({} pages, {}x{} px, {} bytes)",
                written.path.display(),
                written.pages,
                written.width,
                written.height,
                written.file_size
            );
            ConversionResult::succeeded(written, elapsed_ms(start))
        }
        Err(e) => {
            warn!("Conversion of {} failed: {}", pdf_path.display(), e);
            ConversionResult::failed(&e, elapsed_ms(start))
        }
    };

    if let Some(ref cb) = options.progress_callback {
        cb.on_conversion_complete(&result);
    }
    result
}

/// Download `url`, convert it, and delete the download.
///
/// `output = None` writes `<url file stem>_stitched.png` into the current
/// directory.
pub async fn convert_url<R: PageRenderer + ?Sized>(
    renderer: &R,
    url: &str,
    output: Option<&Path>,
    options: &ConversionOptions,
) -> ConversionResult {
    let start = Instant::now();
    let resolved = match input::download_url(url, options.download_timeout_secs).await {
        Ok(r) => r,
        Err(e) => {
            warn!("Download of {} failed: {}", url, e);
            return ConversionResult::failed(&e, elapsed_ms(start));
        }
    };

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}{OUTPUT_SUFFIX}.png",
            stem_of(&input::filename_from_url(url))
        ))
    });

    let mut result = run_blocking(|| {
        convert_file(renderer, resolved.path(), Some(&output_path), options)
    });
    result.duration_ms = elapsed_ms(start);
    // `resolved` drops here, removing the temp dir.
    result
}

/// Convert a local path or an HTTP(S) URL.
pub async fn convert<R: PageRenderer + ?Sized>(
    renderer: &R,
    input_str: &str,
    output: Option<&Path>,
    options: &ConversionOptions,
) -> ConversionResult {
    if input::is_url(input_str) {
        convert_url(renderer, input_str, output, options).await
    } else {
        run_blocking(|| convert_file(renderer, input_str, output, options))
    }
}

fn run<R: PageRenderer + ?Sized>(
    renderer: &R,
    pdf_path: &Path,
    output_path: &Path,
    options: &ConversionOptions,
) -> Result<WrittenImage, PdfStitchError> {
    input::resolve_local(pdf_path)?;

    let render_start = Instant::now();
    let pages = renderer.render(pdf_path, options.dpi, options.password.as_deref())?;
    if let Some(ref cb) = options.progress_callback {
        cb.on_render_complete(pages.len(), elapsed_ms(render_start));
    }

    let composite = stitch::stitch(&pages, options.spacing, options.background)?;
    let page_count = pages.len();
    drop(pages);
    if let Some(ref cb) = options.progress_callback {
        cb.on_stitch_complete(composite.width(), composite.height());
    }

    let file_size = encode::write_composite(&composite, output_path)?;
    let path = std::path::absolute(output_path).unwrap_or_else(|_| output_path.to_path_buf());

    Ok(WrittenImage {
        path,
        file_size,
        pages: page_count,
        width: composite.width(),
        height: composite.height(),
    })
}

/// Run blocking work without stalling a multi-threaded tokio executor.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(h) if h.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn stem_of(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "downloaded".to_string())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_is_sibling_png() {
        assert_eq!(
            default_output_path(Path::new("/decks/q3 review.pdf")),
            PathBuf::from("/decks/q3 review_stitched.png")
        );
        assert_eq!(
            default_output_path(Path::new("slides.PDF")),
            PathBuf::from("slides_stitched.png")
        );
    }

    #[test]
    fn url_stem() {
        assert_eq!(stem_of("deck.pdf"), "deck");
        assert_eq!(stem_of("downloaded.pdf"), "downloaded");
    }

    #[test]
    fn run_blocking_outside_runtime() {
        assert_eq!(run_blocking(|| 7), 7);
    }
}
