//! # edgequake-pdfstitch
//!
//! Render every page of a PDF and stitch the pages vertically into one tall
//! image, with configurable resolution and spacing between pages.
//!
//! ## Why this crate?
//!
//! Slide decks and short documents are often easier to share as a single
//! image that scrolls like a slideshow: it previews inline in chat tools,
//! needs no PDF viewer, and survives any platform that accepts a picture.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate local file, or download from URL to a temp dir
//!  ├─ 2. Render  rasterise every page via pdfium at one shared width
//!  ├─ 3. Stitch  stack pages on a background canvas with fixed spacing
//!  └─ 4. Encode  PNG (or JPEG) written atomically, then stat'ed
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfstitch::{convert_file, ConversionOptions, PdfiumRenderer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Finds or downloads the pdfium library once.
//!     let renderer = PdfiumRenderer::initialise(None)?;
//!     let options = ConversionOptions::builder().dpi(150).spacing(10).build()?;
//!
//!     let result = convert_file(&renderer, "deck.pdf", None, &options);
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfstitch` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod skill;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::convert_batch;
pub use config::{parse_hex_color, ConversionOptions, ConversionOptionsBuilder};
pub use convert::{convert, convert_file, convert_url, default_output_path};
pub use error::{ErrorKind, PdfStitchError};
pub use output::{BatchEntry, BatchResult, ConversionResult};
pub use pipeline::render::{PageRenderer, PageSequence, PdfiumRenderer};
pub use pipeline::stitch::stitch;
pub use progress::{ConversionProgressCallback, ProgressCallback};
pub use skill::{skill_info, SkillInfo};
