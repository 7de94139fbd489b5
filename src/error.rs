//! Error types for the pdfmap library.
//!
//! Two error types for two failure modes:
//!
//! * [`ViewerError`] is **fatal**: the view cannot be produced at all (file
//!   missing, wrong extension, undecodable PDF, invalid map bounds). Returned
//!   as `Err(ViewerError)` from the top-level `render_view*` functions.
//!
//! * [`PageError`] is **non-fatal**: a single page failed to rasterise while
//!   the rest of the document is fine. Collected in
//!   [`crate::output::ViewOutput::page_errors`]; the failed page is drawn as
//!   a blank placeholder so the container keeps its measured size.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfmap library.
#[derive(Debug, Error)]
pub enum ViewerError {
    // ── Intake errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file picker filter rejected the file's extension.
    #[error("Unsupported file type for '{path}': expected one of [{accepted}]")]
    UnsupportedFileType { path: PathBuf, accepted: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The renderer could not decode the document.
    #[error("Document '{path}' could not be decoded: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("Document '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for document '{path}'")]
    WrongPassword { path: PathBuf },

    /// The document decoded but reports zero pages; there is nothing to measure.
    #[error("Document '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Map bounds violate `xmax > xmin` / `ymax > ymin`, or are not finite.
    #[error("Invalid map bounds: {0}")]
    InvalidBounds(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The overlay file could not be read.
    #[error("Failed to read overlay file '{path}': {source}")]
    OverlayRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The overlay file is not valid overlay JSON.
    #[error("Failed to parse overlay file '{path}': {detail}")]
    OverlayParse { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output image.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding of the composed view failed.
    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install pdfium system-wide so the platform loader can find it.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is replaced with a blank placeholder of the same width so the
/// container measurement, and therefore marker placement, stays stable.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } => *page,
        }
    }
}
