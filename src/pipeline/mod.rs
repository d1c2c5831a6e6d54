//! Pipeline stages for PDF-to-long-image conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the rendering backend can be swapped without
//! touching the stitcher.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ stitch ──▶ encode
//! (URL/path) (pdfium)  (canvas)   (PNG/JPEG on disk)
//! ```
//!
//! 1. [`input`]  — validate a local path, or download a URL to a temp dir
//! 2. [`render`] — rasterise every page at one shared pixel width
//! 3. [`stitch`] — stack the pages on a background canvas with fixed spacing
//! 4. [`encode`] — encode the composite and write it atomically

pub mod encode;
pub mod input;
pub mod render;
pub mod stitch;
