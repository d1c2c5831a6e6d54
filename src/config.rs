//! Configuration types for PDF-to-long-image conversion.
//!
//! Every knob lives in [`ConversionOptions`], built via its
//! [`ConversionOptionsBuilder`]. Options are immutable once built and are
//! shared by reference across all files of a batch.

use crate::error::PdfStitchError;
use crate::progress::ProgressCallback;
use image::Rgb;
use std::fmt;

/// Lowest accepted rendering resolution.
pub const MIN_DPI: u32 = 1;
/// Highest accepted rendering resolution. An A4 page at 1200 DPI is already
/// ~10 000 × 14 000 px.
pub const MAX_DPI: u32 = 1200;

/// Options for one conversion (or for every file of a batch).
///
/// # Example
/// ```rust
/// use edgequake_pdfstitch::ConversionOptions;
///
/// let options = ConversionOptions::builder()
///     .dpi(200)
///     .spacing(15)
///     .build()
///     .unwrap();
/// assert_eq!(options.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ConversionOptions {
    /// Rendering resolution in dots per inch. Default: 150.
    ///
    /// Page pixel width is `page_width_in_points × dpi / 72`, so a US-Letter
    /// page at 150 DPI renders 1275 px wide.
    pub dpi: u32,

    /// Pixels of background inserted between consecutive pages. Default: 10.
    pub spacing: u32,

    /// Canvas fill, visible in the gaps between pages. Default: opaque white.
    pub background: Rgb<u8>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Optional observer for conversion and batch events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            spacing: 10,
            background: Rgb([255, 255, 255]),
            password: None,
            download_timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionOptions")
            .field("dpi", &self.dpi)
            .field("spacing", &self.spacing)
            .field("background", &self.background)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionOptions {
    /// Create a new builder for `ConversionOptions`.
    pub fn builder() -> ConversionOptionsBuilder {
        ConversionOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ConversionOptions`].
#[derive(Debug)]
pub struct ConversionOptionsBuilder {
    options: ConversionOptions,
}

impl ConversionOptionsBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.dpi = dpi;
        self
    }

    pub fn spacing(mut self, px: u32) -> Self {
        self.options.spacing = px;
        self
    }

    pub fn background(mut self, color: Rgb<u8>) -> Self {
        self.options.background = color;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.options.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.options.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ConversionOptions, PdfStitchError> {
        let o = &self.options;
        if !(MIN_DPI..=MAX_DPI).contains(&o.dpi) {
            return Err(PdfStitchError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                o.dpi
            )));
        }
        if o.download_timeout_secs == 0 {
            return Err(PdfStitchError::InvalidConfig(
                "Download timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.options)
    }
}

/// Parse `#RRGGBB`, `RRGGBB` or `#RGB` into an opaque colour.
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, PdfStitchError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || PdfStitchError::InvalidConfig(format!("'{s}' is not a #RRGGBB colour"));

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| {
        expanded
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let o = ConversionOptions::default();
        assert_eq!(o.dpi, 150);
        assert_eq!(o.spacing, 10);
        assert_eq!(o.background, Rgb([255, 255, 255]));
        assert_eq!(o.download_timeout_secs, 30);
        assert!(o.password.is_none());
    }

    #[test]
    fn zero_dpi_rejected() {
        let err = ConversionOptions::builder().dpi(0).build().unwrap_err();
        assert!(err.to_string().contains("DPI"));
    }

    #[test]
    fn huge_dpi_rejected() {
        assert!(ConversionOptions::builder().dpi(MAX_DPI + 1).build().is_err());
        assert!(ConversionOptions::builder().dpi(MAX_DPI).build().is_ok());
    }

    #[test]
    fn zero_spacing_allowed() {
        let o = ConversionOptions::builder().spacing(0).build().unwrap();
        assert_eq!(o.spacing, 0);
    }

    #[test]
    fn debug_redacts_password() {
        let o = ConversionOptions::builder().password("hunter2").build().unwrap();
        let dbg = format!("{o:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ffffff").unwrap(), Rgb([255, 255, 255]));
        assert_eq!(parse_hex_color("102030").unwrap(), Rgb([0x10, 0x20, 0x30]));
        assert_eq!(parse_hex_color("#f00").unwrap(), Rgb([255, 0, 0]));
        assert!(parse_hex_color("#ff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
        assert!(parse_hex_color("#ééé").is_err());
    }
}
