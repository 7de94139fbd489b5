//! Configuration for rendering a marked-up document view.
//!
//! All behaviour is controlled through [`ViewerConfig`], built via its
//! [`ViewerConfigBuilder`]. Markers and bounds usually arrive from an
//! [`OverlayFile`]; without one the built-in example overlay is used.

use crate::document::FileFilter;
use crate::error::ViewerError;
use crate::geometry::{MapBounds, Marker};
use crate::overlay::{MarkerAnchor, MarkerStyle};
use crate::progress::ProgressCallback;
use crate::viewport::{PanZoom, ViewportSize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Example overlay used when none is configured.
pub const DEFAULT_MARKERS: [Marker; 3] = [
    Marker::new(11.0, 5.0),
    Marker::new(4.0, 7.0),
    Marker::new(4.0, 4.0),
];

/// Map extent matching [`DEFAULT_MARKERS`].
pub const DEFAULT_BOUNDS: MapBounds = MapBounds::new_unchecked(2.0, 12.0, 3.0, 23.0);

/// Configuration for one document view.
///
/// # Example
/// ```rust
/// use pdfmap::{MapBounds, Marker, ViewerConfig};
///
/// let config = ViewerConfig::builder()
///     .bounds(MapBounds::new(0.0, 100.0, 0.0, 50.0).unwrap())
///     .markers(vec![Marker::new(50.0, 25.0)])
///     .marker_size(12)
///     .build()
///     .unwrap();
/// assert_eq!(config.markers.len(), 1);
/// ```
#[derive(Clone)]
pub struct ViewerConfig {
    /// Extent of map space. Default: `{2, 12, 3, 23}`.
    pub bounds: MapBounds,

    /// Markers in map space. Default: the three example markers.
    pub markers: Vec<Marker>,

    /// Appearance shared by every marker.
    pub marker_style: MarkerStyle,

    /// Width every page is rendered at, in pixels. Range: 100–8000. Default: 800.
    pub page_width: u32,

    /// Cap on a rendered page's height in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Vertical gap between stacked pages in pixels. Range: 0–1000. Default: 8.
    pub page_gap: u32,

    /// Fill behind and between pages. Default: light grey.
    pub background: [u8; 4],

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library path. Falls back to `PDFIUM_LIB_PATH`, then
    /// the system library.
    pub pdfium_library: Option<PathBuf>,

    /// Extensions accepted at selection time. Default: `.pdf`.
    pub file_filter: FileFilter,

    /// Output viewport size. `None` shows the whole content.
    pub viewport: Option<ViewportSize>,

    /// Initial pan/zoom transform. Default: identity.
    pub pan_zoom: PanZoom,

    /// Per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BOUNDS,
            markers: DEFAULT_MARKERS.to_vec(),
            marker_style: MarkerStyle::default(),
            page_width: 800,
            max_rendered_pixels: 2000,
            page_gap: 8,
            background: [230, 230, 230, 255],
            password: None,
            pdfium_library: None,
            file_filter: FileFilter::default(),
            viewport: None,
            pan_zoom: PanZoom::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ViewerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerConfig")
            .field("bounds", &self.bounds)
            .field("markers", &self.markers.len())
            .field("marker_style", &self.marker_style)
            .field("page_width", &self.page_width)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("page_gap", &self.page_gap)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field("file_filter", &self.file_filter)
            .field("viewport", &self.viewport)
            .field("pan_zoom", &self.pan_zoom)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ViewProgressCallback>"),
            )
            .finish()
    }
}

impl ViewerConfig {
    /// Create a new builder for `ViewerConfig`.
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ViewerConfig`].
#[derive(Debug)]
pub struct ViewerConfigBuilder {
    config: ViewerConfig,
}

impl ViewerConfigBuilder {
    pub fn bounds(mut self, bounds: MapBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    pub fn markers(mut self, markers: Vec<Marker>) -> Self {
        self.config.markers = markers;
        self
    }

    /// Take bounds and markers from a parsed overlay file.
    pub fn overlay(mut self, overlay: OverlayFile) -> Self {
        self.config.bounds = overlay.bounds;
        self.config.markers = overlay.markers;
        self
    }

    pub fn marker_style(mut self, style: MarkerStyle) -> Self {
        self.config.marker_style = style;
        self
    }

    pub fn marker_size(mut self, px: u32) -> Self {
        self.config.marker_style.size_px = px.clamp(1, 256);
        self
    }

    pub fn marker_color(mut self, rgba: [u8; 4]) -> Self {
        self.config.marker_style.color = rgba;
        self
    }

    pub fn marker_anchor(mut self, anchor: MarkerAnchor) -> Self {
        self.config.marker_style.anchor = anchor;
        self
    }

    pub fn page_width(mut self, px: u32) -> Self {
        self.config.page_width = px.clamp(100, 8000);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn page_gap(mut self, px: u32) -> Self {
        self.config.page_gap = px.min(1000);
        self
    }

    pub fn background(mut self, rgba: [u8; 4]) -> Self {
        self.config.background = rgba;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn file_filter(mut self, filter: FileFilter) -> Self {
        self.config.file_filter = filter;
        self
    }

    pub fn viewport(mut self, size: ViewportSize) -> Self {
        self.config.viewport = Some(size);
        self
    }

    pub fn pan_zoom(mut self, pan_zoom: PanZoom) -> Self {
        self.config.pan_zoom = pan_zoom;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ViewerConfig, ViewerError> {
        let c = &self.config;
        c.bounds.validate()?;
        if let Some((i, m)) = c
            .markers
            .iter()
            .enumerate()
            .find(|(_, m)| !m.x.is_finite() || !m.y.is_finite())
        {
            return Err(ViewerError::InvalidConfig(format!(
                "marker {i} has a non-finite coordinate: ({}, {})",
                m.x, m.y
            )));
        }
        if c.file_filter.is_empty() {
            return Err(ViewerError::InvalidConfig(
                "file filter must accept at least one extension".into(),
            ));
        }
        if let Some(v) = c.viewport {
            if v.width == 0 || v.height == 0 {
                return Err(ViewerError::InvalidConfig(format!(
                    "viewport must be non-empty, got {}x{}",
                    v.width, v.height
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Overlay file ─────────────────────────────────────────────────────────

/// Markers and bounds supplied as JSON.
///
/// ```json
/// { "bounds": { "xmin": 2, "xmax": 12, "ymin": 3, "ymax": 23 },
///   "markers": [ { "x": 11, "y": 5 } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayFile {
    pub bounds: MapBounds,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Default for OverlayFile {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BOUNDS,
            markers: DEFAULT_MARKERS.to_vec(),
        }
    }
}

impl OverlayFile {
    /// Parse overlay JSON and validate its bounds.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, ViewerError> {
        let overlay: OverlayFile =
            serde_json::from_str(json).map_err(|e| ViewerError::OverlayParse {
                path: origin.to_path_buf(),
                detail: e.to_string(),
            })?;
        overlay.bounds.validate()?;
        Ok(overlay)
    }

    /// Read and parse an overlay file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ViewerError::OverlayRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_json(&json, path)
    }
}
