//! Progress-callback trait for view rendering events.
//!
//! Inject an [`Arc<dyn ViewProgressCallback>`] via
//! [`crate::config::ViewerConfigBuilder::progress_callback`] to hear about
//! each stage: selection, load, per-page rasterisation, final composition.
//!
//! # Example
//!
//! ```rust
//! use pdfmap::{ViewProgressCallback, ViewerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     rendered: AtomicUsize,
//! }
//!
//! impl ViewProgressCallback for PageCounter {
//!     fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = ViewerConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { rendered: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::compose::render_view`] as the view is produced.
///
/// All methods default to no-ops.
pub trait ViewProgressCallback: Send + Sync {
    /// A document was accepted by the intake.
    fn on_document_selected(&self, name: &str) {
        let _ = name;
    }

    /// The renderer reported the page count for the current document.
    fn on_document_loaded(&self, page_count: usize) {
        let _ = page_count;
    }

    /// One page finished rasterising.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: pages in the document
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// One page failed to rasterise; a blank placeholder takes its place.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// The view was composed.
    ///
    /// # Arguments
    /// * `page_count`   : pages stacked into the content
    /// * `markers_drawn`: markers that touched at least one content pixel
    fn on_view_complete(&self, page_count: usize, markers_drawn: usize) {
        let _ = (page_count, markers_drawn);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ViewProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ViewerConfig`].
pub type ProgressCallback = Arc<dyn ViewProgressCallback>;
