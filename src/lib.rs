//! # pdfmap
//!
//! Render a PDF inside a pan/zoom viewport with map-space markers drawn on
//! top of its pages.
//!
//! A document is selected, decoded off the async executor, and its pages are
//! stacked into one scrollable surface. Markers given in a rectangular map
//! coordinate space are projected onto that surface (x grows right, y grows
//! up) and the result is viewed through a pan/zoom transform.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Intake   validate path, extension, readability
//!  ├─ 2. Select   new load token; stale loads are discarded
//!  ├─ 3. Load     decode via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Render   rasterise every page, stack with gaps
//!  ├─ 5. Overlay  map → pixel projection, draw markers
//!  └─ 6. View     pan/zoom into the viewport, encode PNG
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfmap::{render_view, MapBounds, Marker, ViewerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ViewerConfig::builder()
//!         .bounds(MapBounds::new(0.0, 100.0, 0.0, 50.0)?)
//!         .markers(vec![Marker::new(25.0, 10.0), Marker::new(75.0, 40.0)])
//!         .build()?;
//!     let output = render_view("floor-plan.pdf", &config).await?;
//!     println!("{} pages, {} markers drawn", output.page_count, output.markers_drawn);
//!     Ok(())
//! }
//! ```
//!
//! ## Projection
//!
//! ```rust
//! use pdfmap::geometry::{map_to_pixel, ContainerSize, MapBounds, Marker};
//!
//! let bounds = MapBounds::new(2.0, 12.0, 3.0, 23.0).unwrap();
//! let p = map_to_pixel(&Marker::new(12.0, 23.0), &bounds, ContainerSize::new(1000.0, 2000.0));
//! assert_eq!((p.x, p.y), (1000.0, 0.0));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfmap` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfmap = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compose;
pub mod config;
pub mod document;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod output;
pub mod overlay;
pub mod progress;
pub mod renderer;
pub mod session;
pub mod viewer;
pub mod viewport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compose::{render_view, render_view_sync, render_view_to_file, render_view_with, view_from_bytes};
pub use config::{OverlayFile, ViewerConfig, ViewerConfigBuilder, DEFAULT_BOUNDS, DEFAULT_MARKERS};
pub use document::{open_document, DocumentHandle, FileFilter};
pub use error::{PageError, ViewerError};
pub use geometry::{map_to_pixel, ContainerSize, MapBounds, Marker, PixelPoint};
pub use output::{ViewOutput, ViewStats};
pub use overlay::{MarkerAnchor, MarkerPlacement, MarkerStyle};
pub use progress::{NoopProgressCallback, ProgressCallback, ViewProgressCallback};
pub use renderer::{DocumentRenderer, PdfiumRenderer};
pub use session::{EventSender, ViewerEvent, ViewerSession};
pub use viewer::{Frame, LoadToken, PageUnit, Viewer, ViewerState};
pub use viewport::{PanZoom, ViewportSize};
