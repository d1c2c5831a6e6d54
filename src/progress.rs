//! Progress-callback trait for conversion and batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionOptionsBuilder::progress_callback`] to be told
//! when each stage of a conversion finishes and when each file of a batch is
//! done. The CLI uses it to drive an `indicatif` progress bar; library callers
//! can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfstitch::{ConversionOptions, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for PageCounter {
//!     fn on_render_complete(&self, pages: usize, _elapsed_ms: u64) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//! let options = ConversionOptions::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ConversionResult;
use std::path::Path;
use std::sync::Arc;

/// Observer for conversion events. All methods default to no-ops.
///
/// Calls arrive on whichever thread runs the conversion; implementations
/// must be `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// A single-file conversion is about to render `input`.
    fn on_conversion_start(&self, input: &Path) {
        let _ = input;
    }

    /// Every page has been rasterised.
    fn on_render_complete(&self, pages: usize, elapsed_ms: u64) {
        let _ = (pages, elapsed_ms);
    }

    /// The composite canvas is assembled.
    fn on_stitch_complete(&self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// The conversion finished, successfully or not.
    fn on_conversion_complete(&self, result: &ConversionResult) {
        let _ = result;
    }

    /// A batch run found `total` PDF files.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// File `index` (1-based) of `total` in a batch has been processed.
    fn on_batch_file_complete(&self, index: usize, total: usize, file: &str, success: bool) {
        let _ = (index, total, file, success);
    }
}

/// Shared handle stored in [`crate::config::ConversionOptions`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BatchCounter {
        ok: AtomicUsize,
        failed: AtomicUsize,
    }

    impl ConversionProgressCallback for BatchCounter {
        fn on_batch_file_complete(&self, _index: usize, _total: usize, _file: &str, success: bool) {
            if success {
                self.ok.fetch_add(1, Ordering::SeqCst);
            } else {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let cb = BatchCounter {
            ok: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };
        cb.on_conversion_start(Path::new("a.pdf"));
        cb.on_render_complete(3, 12);
        cb.on_stitch_complete(100, 200);
        cb.on_batch_start(2);
        assert_eq!(cb.ok.load(Ordering::SeqCst), 0);
        assert_eq!(cb.failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn overridden_method_receives_events() {
        let cb = Arc::new(BatchCounter {
            ok: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        });
        let dyn_cb: ProgressCallback = cb.clone();
        dyn_cb.on_batch_file_complete(1, 3, "a.pdf", true);
        dyn_cb.on_batch_file_complete(2, 3, "b.pdf", false);
        dyn_cb.on_batch_file_complete(3, 3, "c.pdf", true);
        assert_eq!(cb.ok.load(Ordering::SeqCst), 2);
        assert_eq!(cb.failed.load(Ordering::SeqCst), 1);
    }
}
