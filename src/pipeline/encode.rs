//! Image encoding: composite `RgbImage` → PNG or JPEG file on disk.
//!
//! PNG is the default and is written with maximum zlib compression and
//! adaptive filtering; slide decks are mostly flat colour and compress well.
//! A `.jpg`/`.jpeg` output path selects JPEG at quality 95.
//!
//! Writes are atomic: bytes go to a temp file in the destination directory,
//! which is renamed over the target only once fully written. A failed
//! conversion never leaves a truncated image behind.

use crate::error::PdfStitchError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::RgbImage;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// JPEG quality used for `.jpg`/`.jpeg` outputs.
pub const JPEG_QUALITY: u8 = 95;

/// Encoded file format, chosen from the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// `.jpg`/`.jpeg` (any case) → JPEG; everything else → PNG.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => OutputFormat::Jpeg,
            _ => OutputFormat::Png,
        }
    }
}

/// Encode `img` into an in-memory buffer.
pub fn encode_composite(img: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut buf,
            CompressionType::Best,
            FilterType::Adaptive,
        ))?,
        OutputFormat::Jpeg => {
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?
        }
    }
    debug!("Encoded composite as {:?} → {} bytes", format, buf.len());
    Ok(buf)
}

/// Encode `img` and atomically write it to `path`, returning the on-disk size.
pub fn write_composite(img: &RgbImage, path: &Path) -> Result<u64, PdfStitchError> {
    let write_failed = |source: std::io::Error| PdfStitchError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let bytes = encode_composite(img, OutputFormat::from_path(path)).map_err(|e| {
        PdfStitchError::EncodeFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdfstitch-")
        .tempfile_in(dir)
        .map_err(write_failed)?;
    tmp.write_all(&bytes).map_err(write_failed)?;
    tmp.flush().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    let size = std::fs::metadata(path).map_err(write_failed)?.len();
    debug!("Wrote {} ({} bytes)", path.display(), size);
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample() -> RgbImage {
        RgbImage::from_fn(16, 32, |x, y| Rgb([(x * 8) as u8, (y * 4) as u8, 128]))
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.png")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("a.JPG")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("a.jpeg")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("noext")), OutputFormat::Png);
    }

    #[test]
    fn png_signature_and_lossless_decode() {
        let img = sample();
        let bytes = encode_composite(&img, OutputFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_signature() {
        let bytes = encode_composite(&sample(), OutputFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn write_creates_parents_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/deeper/deck_stitched.png");
        let size = write_composite(&sample(), &out).unwrap();
        assert!(out.exists());
        assert_eq!(size, std::fs::metadata(&out).unwrap().len());

        let leftovers: Vec<_> = std::fs::read_dir(out.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".pdfstitch-"))
            .collect();
        assert!(leftovers.is_empty(), "temp file left behind");
    }
}
